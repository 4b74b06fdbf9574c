//! Built-in Moroccan knowledge base
//!
//! Staple grains, breads and pastries with their gluten status, common
//! produce and proteins, curated gluten-free substitutes, and a handful of
//! traditional dishes and packaged products expanded into their
//! ingredients.

use super::loader::parse_knowledge_base;
use crate::domain::{DomainError, KnowledgeBaseFile};

const SEED_JSON: &str = include_str!("seed.json");

/// Raw seed document, as written by `export-seed`
pub fn seed_json() -> &'static str {
    SEED_JSON
}

/// Parse and validate the embedded seed
pub fn seed_knowledge_base() -> Result<KnowledgeBaseFile, DomainError> {
    parse_knowledge_base(SEED_JSON)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{
        AggregateStatus, GlutenPipeline, GlutenStatus, KnowledgeIndex, Language, PipelineConfig,
        QueryRequest, RecordId,
    };
    use crate::infrastructure::embedding::LocalEmbeddingProvider;

    async fn pipeline() -> GlutenPipeline {
        let index = Arc::new(KnowledgeIndex::new(Arc::new(LocalEmbeddingProvider::new(256))));
        index.load(seed_knowledge_base().unwrap()).await.unwrap();
        GlutenPipeline::new(index, PipelineConfig::default())
    }

    fn id(value: &str) -> RecordId {
        RecordId::new(value).unwrap()
    }

    #[test]
    fn test_seed_is_valid() {
        let file = seed_knowledge_base().unwrap();

        assert!(file.ingredients.len() > 40);
        for recipe in [
            "tagine",
            "couscous_dish",
            "harira",
            "pastilla",
            "zaalouk",
            "sardines_in_oil",
            "moroccan_bread",
            "rice_cookies",
        ] {
            assert!(file.recipes.iter().any(|r| r.id == id(recipe)), "missing {}", recipe);
        }
    }

    #[test]
    fn test_gluten_grains_have_substitutes() {
        let file = seed_knowledge_base().unwrap();

        for grain in ["wheat", "barley", "rye", "couscous", "semolina", "bulgur", "freekeh"] {
            let record = file.ingredients.iter().find(|r| r.id == id(grain)).unwrap();
            assert_eq!(record.gluten_status, GlutenStatus::Contains, "{}", grain);
            assert!(!record.substitutes.is_empty(), "{}", grain);
        }
    }

    #[test]
    fn test_every_ingredient_named_in_arabic_and_english() {
        let file = seed_knowledge_base().unwrap();

        for record in &file.ingredients {
            assert!(record.names.contains_key(&Language::Arabic), "{}", record.id);
            assert!(record.names.contains_key(&Language::English), "{}", record.id);
        }
    }

    #[tokio::test]
    async fn test_bread_with_wheat() {
        let response = pipeline().await.query(QueryRequest::new("خبز بالقمح")).await.unwrap();

        assert_eq!(response.status, AggregateStatus::Contains);
        assert!(response
            .suggestions
            .iter()
            .any(|s| s.target == id("rice_flour") || s.target == id("corn_bread")));
        assert!(response.suggestions.iter().all(|s| s.source == id("bread") || s.source == id("wheat")));
    }

    #[tokio::test]
    async fn test_vegetable_salad() {
        let response = pipeline().await.query(QueryRequest::new("سلطة بالخضار")).await.unwrap();

        assert_eq!(response.status, AggregateStatus::Free);
        assert!(response.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_darija_couscous_question() {
        let response = pipeline()
            .await
            .query(QueryRequest::new("واش الكسكس فيه الغلوتين"))
            .await
            .unwrap();

        assert_eq!(response.language, Language::Darija);
        assert_eq!(response.status, AggregateStatus::Contains);
        assert!(response.suggestions.iter().any(|s| s.target == id("corn_couscous")));
    }

    #[tokio::test]
    async fn test_arabizi_question_answered_in_latin_letters() {
        let response = pipeline()
            .await
            .query(QueryRequest::new("wach zraa fih gluten"))
            .await
            .unwrap();
        let has_arabic = |text: &str| text.chars().any(crate::domain::script::is_arabic_letter);

        assert_eq!(response.language, Language::Darija);
        assert_eq!(response.script, crate::domain::ScriptTag::Latin);
        assert_eq!(response.status, AggregateStatus::Contains);
        assert!(response.text.starts_with("Hadchi fih gluten: 9am7."), "{}", response.text);
        assert!(!has_arabic(&response.text), "{}", response.text);
        assert!(!response.suggestions.is_empty());
        assert!(response.suggestions.iter().all(|s| !has_arabic(&s.name)));
    }

    #[tokio::test]
    async fn test_products_cite_their_brand() {
        let pipeline = pipeline().await;

        let cookies = pipeline.query(QueryRequest::new("rice cookies")).await.unwrap();
        assert_eq!(cookies.status, AggregateStatus::Free);
        assert!(cookies.mentions.iter().all(|m| m.recipe == Some(id("rice_cookies"))));
        assert!(cookies.text.contains("Meknes Sweets"), "{}", cookies.text);

        let bread = pipeline.query(QueryRequest::new("Moroccan bread")).await.unwrap();
        assert_eq!(bread.status, AggregateStatus::Mixed);
        assert!(bread.mentions.iter().any(|m| m.record == Some(id("wheat_flour"))));
        assert!(bread.text.contains("Local Bakery"), "{}", bread.text);
    }

    #[tokio::test]
    async fn test_tagine_is_free() {
        let response = pipeline().await.query(QueryRequest::new("tagine")).await.unwrap();

        assert_eq!(response.status, AggregateStatus::Free);
        assert!(response.mentions.iter().all(|m| m.recipe == Some(id("tagine"))));
    }

    #[tokio::test]
    async fn test_harira_is_mixed() {
        let response = pipeline().await.query(QueryRequest::new("harira")).await.unwrap();

        assert_eq!(response.status, AggregateStatus::Mixed);
        assert!(!response.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_french_rice_flour() {
        let response = pipeline()
            .await
            .query(QueryRequest::new("farine de riz"))
            .await
            .unwrap();

        assert_eq!(response.language, Language::French);
        assert_eq!(response.status, AggregateStatus::Free);
    }
}
