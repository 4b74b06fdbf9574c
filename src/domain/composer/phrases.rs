//! Localized response templates

use crate::domain::classifier::AggregateStatus;
use crate::domain::script::{Language, Locale};
use crate::domain::suggester::RationaleTag;

/// Fixed templates and phrases for one language
#[derive(Debug)]
pub struct Phrases {
    pub contains: &'static str,
    pub free: &'static str,
    pub mixed: &'static str,
    pub unknown: &'static str,
    /// Phrase each status template states; narrations must repeat it
    pub contains_phrase: &'static str,
    pub free_phrase: &'static str,
    pub mixed_phrase: &'static str,
    pub unknown_phrase: &'static str,
    pub recipe: &'static str,
    pub evidence: &'static str,
    pub caveats: &'static str,
    pub confidence: &'static str,
    pub degraded: &'static str,
    pub suggestions: &'static str,
    pub suggestion: &'static str,
    pub no_substitute: &'static str,
    pub curated: &'static str,
    pub regional: &'static str,
    pub same_role: &'static str,
    pub neighbor: &'static str,
    pub separator: &'static str,
    /// Name of the language, used in narration prompts
    pub name: &'static str,
}

impl Phrases {
    pub fn status_template(&self, status: AggregateStatus) -> &'static str {
        match status {
            AggregateStatus::Contains => self.contains,
            AggregateStatus::Free => self.free,
            AggregateStatus::Mixed => self.mixed,
            AggregateStatus::Unknown => self.unknown,
        }
    }

    pub fn status_phrase(&self, status: AggregateStatus) -> &'static str {
        match status {
            AggregateStatus::Contains => self.contains_phrase,
            AggregateStatus::Free => self.free_phrase,
            AggregateStatus::Mixed => self.mixed_phrase,
            AggregateStatus::Unknown => self.unknown_phrase,
        }
    }

    pub fn rationale(&self, tag: RationaleTag) -> &'static str {
        match tag {
            RationaleTag::CuratedSubstitute => self.curated,
            RationaleTag::RegionalStaple => self.regional,
            RationaleTag::SameCulinaryRole => self.same_role,
            RationaleTag::SemanticNeighbor => self.neighbor,
        }
    }
}

static ENGLISH: Phrases = Phrases {
    contains: "This contains gluten: ${var:items}.",
    free: "This is gluten-free: ${var:items}.",
    mixed: "This partly contains gluten. With gluten: ${var:gluten-items}. Without gluten: ${var:free-items}.",
    unknown: "I cannot confirm the gluten status of this.",
    contains_phrase: "contains gluten",
    free_phrase: "is gluten-free",
    mixed_phrase: "partly contains gluten",
    unknown_phrase: "cannot confirm",
    recipe: "From ${var:recipe}: ${var:items}.",
    evidence: "Sources: ${var:evidence}.",
    caveats: "Not recognized: ${var:caveats}.",
    confidence: "Confidence: ${var:confidence}%.",
    degraded: "Matched by spelling only; confidence is reduced.",
    suggestions: "Gluten-free alternatives:",
    suggestion: "- ${var:target} instead of ${var:source} (${var:rationale})",
    no_substitute: "No known gluten-free substitute.",
    curated: "recommended substitute",
    regional: "regional staple",
    same_role: "same culinary role",
    neighbor: "similar ingredient",
    separator: ", ",
    name: "English",
};

static FRENCH: Phrases = Phrases {
    contains: "Ceci contient du gluten : ${var:items}.",
    free: "Ceci est sans gluten : ${var:items}.",
    mixed: "Ceci contient en partie du gluten. Avec gluten : ${var:gluten-items}. Sans gluten : ${var:free-items}.",
    unknown: "Impossible de confirmer la présence de gluten.",
    contains_phrase: "contient du gluten",
    free_phrase: "est sans gluten",
    mixed_phrase: "contient en partie du gluten",
    unknown_phrase: "impossible de confirmer",
    recipe: "Dans ${var:recipe} : ${var:items}.",
    evidence: "Sources : ${var:evidence}.",
    caveats: "Non reconnu : ${var:caveats}.",
    confidence: "Confiance : ${var:confidence} %.",
    degraded: "Correspondance orthographique uniquement ; confiance réduite.",
    suggestions: "Alternatives sans gluten :",
    suggestion: "- ${var:target} à la place de ${var:source} (${var:rationale})",
    no_substitute: "Aucun substitut sans gluten connu.",
    curated: "substitut recommandé",
    regional: "produit local",
    same_role: "même usage culinaire",
    neighbor: "ingrédient proche",
    separator: ", ",
    name: "French",
};

static ARABIC: Phrases = Phrases {
    contains: "هذا يحتوي على الغلوتين: ${var:items}.",
    free: "هذا خال من الغلوتين: ${var:items}.",
    mixed: "هذا يحتوي جزئيا على الغلوتين. مع الغلوتين: ${var:gluten-items}. بدون غلوتين: ${var:free-items}.",
    unknown: "لا يمكن التأكد من وجود الغلوتين.",
    contains_phrase: "يحتوي على الغلوتين",
    free_phrase: "خال من الغلوتين",
    mixed_phrase: "يحتوي جزئيا على الغلوتين",
    unknown_phrase: "لا يمكن التأكد",
    recipe: "مكونات ${var:recipe}: ${var:items}.",
    evidence: "المصادر: ${var:evidence}.",
    caveats: "غير معروف: ${var:caveats}.",
    confidence: "درجة الثقة: ${var:confidence}%.",
    degraded: "تمت المطابقة بالكتابة فقط، لذلك الثقة منخفضة.",
    suggestions: "بدائل خالية من الغلوتين:",
    suggestion: "- ${var:target} بدلا من ${var:source} (${var:rationale})",
    no_substitute: "لا يوجد بديل معروف بدون غلوتين.",
    curated: "بديل موصى به",
    regional: "منتج محلي أساسي",
    same_role: "نفس الاستخدام في الطبخ",
    neighbor: "مكون مشابه",
    separator: "، ",
    name: "Modern Standard Arabic",
};

static DARIJA: Phrases = Phrases {
    contains: "هادشي فيه الغلوتين: ${var:items}.",
    free: "هادشي ما فيهش الغلوتين: ${var:items}.",
    mixed: "هادشي فيه شوية ديال الغلوتين. فيهم الغلوتين: ${var:gluten-items}. بلا غلوتين: ${var:free-items}.",
    unknown: "ما قدرتش نعرف الحالة ديال الغلوتين.",
    contains_phrase: "فيه الغلوتين",
    free_phrase: "ما فيهش الغلوتين",
    mixed_phrase: "فيه شوية ديال الغلوتين",
    unknown_phrase: "ما قدرتش نعرف",
    recipe: "ف ${var:recipe}: ${var:items}.",
    evidence: "المصادر: ${var:evidence}.",
    caveats: "ما عرفتش: ${var:caveats}.",
    confidence: "الثقة: ${var:confidence}%.",
    degraded: "التطابق غير بالكتابة، الثقة ناقصة.",
    suggestions: "بدائل بلا غلوتين:",
    suggestion: "- ${var:target} فبلاصة ${var:source} (${var:rationale})",
    no_substitute: "ما لقيت حتى بديل بلا غلوتين.",
    curated: "بديل مزيان",
    regional: "منتوج بلدي",
    same_role: "نفس الاستعمال فالطياب",
    neighbor: "حاجة قريبة",
    separator: "، ",
    name: "Moroccan Darija in Arabic script",
};

static ARABIZI: Phrases = Phrases {
    contains: "Hadchi fih gluten: ${var:items}.",
    free: "Hadchi ma fihch gluten: ${var:items}.",
    mixed: "Hadchi fih chwiya dyal gluten. Fihom gluten: ${var:gluten-items}. Bla gluten: ${var:free-items}.",
    unknown: "Ma 9dertch n3ref l7ala dyal gluten.",
    contains_phrase: "fih gluten",
    free_phrase: "ma fihch gluten",
    mixed_phrase: "fih chwiya dyal gluten",
    unknown_phrase: "ma 9dertch n3ref",
    recipe: "F ${var:recipe}: ${var:items}.",
    evidence: "Lmasader: ${var:evidence}.",
    caveats: "Ma 3reftch: ${var:caveats}.",
    confidence: "Tti9a: ${var:confidence}%.",
    degraded: "Tl9ina ghir b lktaba, tti9a na9sa.",
    suggestions: "Bdayel bla gluten:",
    suggestion: "- ${var:target} f blast ${var:source} (${var:rationale})",
    no_substitute: "Ma l9ina 7ta bdil bla gluten.",
    curated: "bdil mzyan",
    regional: "mntouj beldi",
    same_role: "nefs l'isti3mal f tyab",
    neighbor: "7aja 9riba",
    separator: ", ",
    name: "Moroccan Darija written in Latin letters (Arabizi)",
};

pub fn phrases(locale: Locale) -> &'static Phrases {
    match locale.language {
        Language::Arabic => &ARABIC,
        Language::Darija if !locale.is_native() => &ARABIZI,
        Language::Darija => &DARIJA,
        Language::French => &FRENCH,
        Language::English => &ENGLISH,
    }
}

/// Whether a text states the status phrase of `status` and no phrase of a
/// different status. Phrases contained in the expected one are ignored.
pub fn states_only(text: &str, status: AggregateStatus, locale: Locale) -> bool {
    let phrases = phrases(locale);
    let text = text.to_lowercase();
    let expected = phrases.status_phrase(status);

    if !text.contains(expected) {
        return false;
    }

    [
        AggregateStatus::Contains,
        AggregateStatus::Free,
        AggregateStatus::Mixed,
        AggregateStatus::Unknown,
    ]
    .into_iter()
    .filter(|other| *other != status)
    .map(|other| phrases.status_phrase(other))
    .filter(|phrase| !expected.contains(phrase))
    .all(|phrase| !text.contains(phrase))
}
