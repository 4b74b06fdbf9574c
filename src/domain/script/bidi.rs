//! Simplified Unicode bidirectional reordering
//!
//! Implements the parts of UAX #9 needed for mixed Arabic/Latin text:
//! explicit embeddings, overrides and isolates (X1-X10, reduced), weak type
//! resolution (W1-W7), neutral resolution (N1-N2), implicit levels (I1-I2),
//! line-level reordering (L1-L2) and mirroring (L4). Each line is treated as
//! its own paragraph.

use super::tag::{BidiClass, Direction};

const MAX_DEPTH: u8 = 61;

/// Outcome of reordering a paragraph for display
#[derive(Debug, Clone, PartialEq)]
pub struct BidiReorder {
    /// Source indices in visual (left-to-right display) order; explicit
    /// directional controls are dropped
    pub visual: Vec<usize>,
    /// Resolved embedding level per source index (controls keep their
    /// surrounding level)
    pub levels: Vec<u8>,
    /// Paragraph direction of the first line
    pub base_direction: Direction,
    /// Majority direction of the strong characters
    pub dominant_direction: Direction,
    /// True when unterminated directional controls had to be repaired
    pub repaired: bool,
}

#[derive(Debug, Clone, Copy)]
struct StackEntry {
    level: u8,
    override_dir: Option<Direction>,
    isolate: bool,
}

/// Reorder characters from logical to visual order
pub fn reorder(chars: &[char]) -> BidiReorder {
    let classes: Vec<BidiClass> = chars.iter().map(|c| BidiClass::of(*c)).collect();
    let dominant = dominant_direction(&classes);

    let mut visual = Vec::with_capacity(chars.len());
    let mut levels = vec![0u8; chars.len()];
    let mut base_direction = None;
    let mut repaired = false;

    let mut start = 0;
    while start < chars.len() {
        let end = (start..chars.len())
            .find(|&i| classes[i] == BidiClass::B)
            .unwrap_or(chars.len());

        let line = resolve_line(&classes[start..end], dominant);
        repaired |= line.repaired;
        base_direction.get_or_insert(line.base);

        for (offset, level) in line.levels.iter().enumerate() {
            levels[start + offset] = *level;
        }
        visual.extend(line.visual.into_iter().map(|i| start + i));

        if end < chars.len() {
            levels[end] = line.base.base_level();
            visual.push(end);
        }
        start = end + 1;
    }

    BidiReorder {
        visual,
        levels,
        base_direction: base_direction.unwrap_or(dominant),
        dominant_direction: dominant,
        repaired,
    }
}

/// Mirror a bracket-like character rendered inside a right-to-left run
pub fn mirror(c: char) -> char {
    match c {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '\u{00AB}' => '\u{00BB}',
        '\u{00BB}' => '\u{00AB}',
        other => other,
    }
}

fn dominant_direction(classes: &[BidiClass]) -> Direction {
    let (ltr, rtl) = classes
        .iter()
        .filter_map(|c| c.strong_direction())
        .fold((0usize, 0usize), |(l, r), dir| match dir {
            Direction::Ltr => (l + 1, r),
            Direction::Rtl => (l, r + 1),
        });

    if rtl > ltr { Direction::Rtl } else { Direction::Ltr }
}

struct ResolvedLine {
    levels: Vec<u8>,
    visual: Vec<usize>,
    base: Direction,
    repaired: bool,
}

fn resolve_line(classes: &[BidiClass], dominant: Direction) -> ResolvedLine {
    let base = first_strong(classes).unwrap_or(dominant);
    let base_level = base.base_level();
    let repair_from = first_unterminated(classes);

    // Explicit levels
    let mut types = classes.to_vec();
    let mut levels = vec![base_level; classes.len()];
    let mut stack = vec![StackEntry {
        level: base_level,
        override_dir: None,
        isolate: false,
    }];

    let repair_level = if dominant == base {
        base_level
    } else {
        base_level + 1
    };

    for (i, class) in classes.iter().enumerate() {
        if repair_from.is_some_and(|from| i >= from) {
            levels[i] = repair_level;
            types[i] = if class.is_explicit_control() {
                BidiClass::ON
            } else {
                strong_class(dominant)
            };
            continue;
        }

        let top = *stack.last().unwrap_or(&StackEntry {
            level: base_level,
            override_dir: None,
            isolate: false,
        });
        levels[i] = top.level;

        match class {
            BidiClass::RLE | BidiClass::RLO | BidiClass::RLI => {
                let next = next_odd(top.level);
                if next <= MAX_DEPTH {
                    stack.push(StackEntry {
                        level: next,
                        override_dir: (*class == BidiClass::RLO).then_some(Direction::Rtl),
                        isolate: *class == BidiClass::RLI,
                    });
                }
                types[i] = BidiClass::ON;
            }
            BidiClass::LRE | BidiClass::LRO | BidiClass::LRI | BidiClass::FSI => {
                let next = next_even(top.level);
                if next <= MAX_DEPTH {
                    stack.push(StackEntry {
                        level: next,
                        override_dir: (*class == BidiClass::LRO).then_some(Direction::Ltr),
                        isolate: matches!(class, BidiClass::LRI | BidiClass::FSI),
                    });
                }
                types[i] = BidiClass::ON;
            }
            BidiClass::PDF => {
                if stack.len() > 1 && !top.isolate {
                    stack.pop();
                }
                types[i] = BidiClass::ON;
            }
            BidiClass::PDI => {
                if let Some(pos) = stack.iter().rposition(|entry| entry.isolate) {
                    stack.truncate(pos);
                }
                levels[i] = stack.last().map(|entry| entry.level).unwrap_or(base_level);
                types[i] = BidiClass::ON;
            }
            _ => {
                if let Some(dir) = top.override_dir {
                    types[i] = strong_class(dir);
                }
            }
        }
    }

    resolve_weak(&mut types, &levels);
    resolve_neutral(&mut types, &levels);

    // Implicit levels
    for i in 0..types.len() {
        let level = levels[i];
        levels[i] = match (level % 2 == 0, types[i]) {
            (true, BidiClass::R) => level + 1,
            (true, BidiClass::AN | BidiClass::EN) => level + 2,
            (false, BidiClass::L | BidiClass::EN | BidiClass::AN) => level + 1,
            _ => level,
        };
    }

    // Trailing whitespace returns to the paragraph level
    for i in (0..classes.len()).rev() {
        if matches!(classes[i], BidiClass::WS) || classes[i].is_explicit_control() {
            levels[i] = base_level;
        } else {
            break;
        }
    }

    let kept: Vec<usize> = (0..classes.len())
        .filter(|&i| !classes[i].is_explicit_control())
        .collect();
    let visual = reverse_runs(&kept, &levels);

    ResolvedLine {
        levels,
        visual,
        base,
        repaired: repair_from.is_some(),
    }
}

fn first_strong(classes: &[BidiClass]) -> Option<Direction> {
    let mut isolate_depth = 0usize;
    for class in classes {
        match class {
            BidiClass::LRI | BidiClass::RLI | BidiClass::FSI => isolate_depth += 1,
            BidiClass::PDI => isolate_depth = isolate_depth.saturating_sub(1),
            BidiClass::L | BidiClass::R | BidiClass::AL if isolate_depth == 0 => {
                return class.strong_direction();
            }
            _ => {}
        }
    }
    None
}

/// Position of the earliest opener that is never closed
fn first_unterminated(classes: &[BidiClass]) -> Option<usize> {
    // (position, is_isolate)
    let mut open: Vec<(usize, bool)> = Vec::new();

    for (i, class) in classes.iter().enumerate() {
        match class {
            BidiClass::LRE | BidiClass::RLE | BidiClass::LRO | BidiClass::RLO => {
                open.push((i, false));
            }
            BidiClass::LRI | BidiClass::RLI | BidiClass::FSI => open.push((i, true)),
            BidiClass::PDF => {
                if matches!(open.last(), Some((_, false))) {
                    open.pop();
                }
            }
            BidiClass::PDI => {
                if let Some(pos) = open.iter().rposition(|(_, isolate)| *isolate) {
                    open.truncate(pos);
                }
            }
            _ => {}
        }
    }

    open.first().map(|(pos, _)| *pos)
}

fn strong_class(direction: Direction) -> BidiClass {
    match direction {
        Direction::Ltr => BidiClass::L,
        Direction::Rtl => BidiClass::R,
    }
}

fn next_odd(level: u8) -> u8 {
    if level % 2 == 0 { level + 1 } else { level + 2 }
}

fn next_even(level: u8) -> u8 {
    if level % 2 == 0 { level + 2 } else { level + 1 }
}

/// W1-W7 over the whole line; level boundaries act as sos/eos
fn resolve_weak(types: &mut [BidiClass], levels: &[u8]) {
    let sos = |i: usize| strong_class(Direction::of_level(levels[i]));

    // W1: NSM takes the type of the previous character
    for i in 0..types.len() {
        if types[i] == BidiClass::NSM {
            types[i] = if i == 0 || levels[i - 1] != levels[i] {
                sos(i)
            } else {
                match types[i - 1] {
                    BidiClass::LRM => BidiClass::L,
                    BidiClass::RLM => BidiClass::R,
                    other => other,
                }
            };
        }
    }

    // W2: EN after AL becomes AN; W3: AL becomes R
    let mut last_strong = None;
    for i in 0..types.len() {
        if i == 0 || levels[i - 1] != levels[i] {
            last_strong = Some(sos(i));
        }
        match types[i] {
            BidiClass::L | BidiClass::R | BidiClass::AL => last_strong = Some(types[i]),
            BidiClass::LRM => last_strong = Some(BidiClass::L),
            BidiClass::RLM => last_strong = Some(BidiClass::R),
            BidiClass::EN if last_strong == Some(BidiClass::AL) => types[i] = BidiClass::AN,
            _ => {}
        }
    }
    for t in types.iter_mut() {
        match *t {
            BidiClass::AL | BidiClass::RLM => *t = BidiClass::R,
            BidiClass::LRM => *t = BidiClass::L,
            _ => {}
        }
    }

    // W4: single separators between numbers
    for i in 1..types.len().saturating_sub(1) {
        let (prev, next) = (types[i - 1], types[i + 1]);
        match types[i] {
            BidiClass::ES if prev == BidiClass::EN && next == BidiClass::EN => {
                types[i] = BidiClass::EN
            }
            BidiClass::CS if prev == next && matches!(prev, BidiClass::EN | BidiClass::AN) => {
                types[i] = prev
            }
            _ => {}
        }
    }

    // W5: terminators adjacent to European numbers
    let mut i = 0;
    while i < types.len() {
        if types[i] == BidiClass::ET {
            let run_end = (i..types.len())
                .find(|&j| types[j] != BidiClass::ET)
                .unwrap_or(types.len());
            let touches_en = (i > 0 && types[i - 1] == BidiClass::EN)
                || (run_end < types.len() && types[run_end] == BidiClass::EN);
            if touches_en {
                for t in &mut types[i..run_end] {
                    *t = BidiClass::EN;
                }
            }
            i = run_end;
        } else {
            i += 1;
        }
    }

    // W6: remaining separators and terminators become neutral
    for t in types.iter_mut() {
        if matches!(t, BidiClass::ES | BidiClass::ET | BidiClass::CS) {
            *t = BidiClass::ON;
        }
    }

    // W7: EN preceded by L becomes L
    let mut last_strong = None;
    for i in 0..types.len() {
        if i == 0 || levels[i - 1] != levels[i] {
            last_strong = Some(sos(i));
        }
        match types[i] {
            BidiClass::L | BidiClass::R => last_strong = Some(types[i]),
            BidiClass::EN if last_strong == Some(BidiClass::L) => types[i] = BidiClass::L,
            _ => {}
        }
    }
}

/// N1-N2: neutrals take the surrounding strong direction when both sides
/// agree, otherwise the embedding direction
fn resolve_neutral(types: &mut [BidiClass], levels: &[u8]) {
    let is_neutral = |t: BidiClass| matches!(t, BidiClass::WS | BidiClass::ON | BidiClass::B);
    let as_strong = |t: BidiClass| match t {
        BidiClass::L => Some(Direction::Ltr),
        BidiClass::R | BidiClass::EN | BidiClass::AN => Some(Direction::Rtl),
        _ => None,
    };

    let mut i = 0;
    while i < types.len() {
        if !is_neutral(types[i]) {
            i += 1;
            continue;
        }

        let level = levels[i];
        let run_end = (i..types.len())
            .find(|&j| !is_neutral(types[j]) || levels[j] != level)
            .unwrap_or(types.len());

        let embedding = Direction::of_level(level);
        let before = if i > 0 && levels[i - 1] == level {
            as_strong(types[i - 1]).unwrap_or(embedding)
        } else {
            embedding
        };
        let after = if run_end < types.len() && levels[run_end] == level {
            as_strong(types[run_end]).unwrap_or(embedding)
        } else {
            embedding
        };

        let resolved = strong_class(if before == after { before } else { embedding });
        for t in &mut types[i..run_end] {
            *t = resolved;
        }
        i = run_end;
    }
}

/// L2: reverse every run at or above each odd level, highest first
fn reverse_runs(kept: &[usize], levels: &[u8]) -> Vec<usize> {
    let mut order: Vec<usize> = kept.to_vec();
    let max_level = kept.iter().map(|&i| levels[i]).max().unwrap_or(0);
    let min_level = kept.iter().map(|&i| levels[i]).min().unwrap_or(0);
    let min_odd = if min_level % 2 == 1 {
        min_level
    } else {
        min_level + 1
    };

    let mut level = max_level;
    while level >= min_odd && level > 0 {
        let mut i = 0;
        while i < order.len() {
            if levels[order[i]] >= level {
                let run_end = (i..order.len())
                    .find(|&j| levels[order[j]] < level)
                    .unwrap_or(order.len());
                order[i..run_end].reverse();
                i = run_end;
            } else {
                i += 1;
            }
        }
        level -= 1;
    }

    order
}
