use skilldex_protocol::{CorpusEntry, MatchKind, MatchResult, Span};
use std::cmp::Ordering;
use std::sync::Arc;

/// Scoring weights. The defaults are the editor's tuned values; only the
/// relative ordering they induce (exact > prefix > substring > fuzzy,
/// longer coverage and longer consecutive runs score higher within a
/// tier) is contractual.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreParams {
    pub exact_score: f64,
    pub prefix_base: f64,
    pub prefix_coverage_weight: f64,
    pub substring_base: f64,
    pub substring_coverage_weight: f64,
    /// Weight of `consumed / |query|` in the fuzzy blend.
    pub query_coverage_weight: f64,
    /// Weight of `consumed / |target|` in the fuzzy blend.
    pub target_coverage_weight: f64,
    /// Added per character that continues a consecutive run.
    pub consecutive_increment: f64,
    /// Fuzzy candidates at or below this blended weight are dropped.
    pub fuzzy_threshold: f64,
    /// Multiplier turning the blended weight into a score.
    pub fuzzy_scale: f64,
    /// Flat bonus when the target shares its leading `_`-segment with the
    /// context skill.
    pub context_bonus: f64,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            exact_score: 1000.0,
            prefix_base: 500.0,
            prefix_coverage_weight: 100.0,
            substring_base: 200.0,
            substring_coverage_weight: 50.0,
            query_coverage_weight: 0.5,
            target_coverage_weight: 0.3,
            consecutive_increment: 0.1,
            fuzzy_threshold: 0.3,
            fuzzy_scale: 100.0,
            context_bonus: 50.0,
        }
    }
}

/// Rank `corpus` against `query`, strongest match first.
///
/// Matching is case-insensitive over each entry's name and aliases; the
/// best-scoring target decides the entry's result. Ordering is by match
/// kind first, then score descending, with ties left in corpus order.
///
/// An empty or whitespace-only query matches nothing here; the caller is
/// expected to treat it as "list everything" before ranking.
pub fn rank(
    query: &str,
    corpus: &[Arc<CorpusEntry>],
    context: Option<&str>,
    params: &ScoreParams,
) -> Vec<MatchResult> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let query_chars: Vec<char> = trimmed.chars().map(fold_char).collect();
    let context_head = context.map(leading_segment).filter(|s| !s.is_empty());

    let mut results: Vec<MatchResult> = corpus
        .iter()
        .filter_map(|entry| {
            let mut best: Option<(MatchKind, f64, Vec<Span>)> = None;
            for target in std::iter::once(entry.name.as_str())
                .chain(entry.aliases.iter().map(String::as_str))
            {
                let Some((kind, mut score, spans)) = score_target(&query_chars, target, params)
                else {
                    continue;
                };
                if let Some(head) = &context_head {
                    if leading_segment(target) == *head {
                        score += params.context_bonus;
                    }
                }
                let stronger = match &best {
                    None => true,
                    Some((best_kind, best_score, _)) => {
                        (kind.rank(), score) > (best_kind.rank(), *best_score)
                    }
                };
                if stronger {
                    best = Some((kind, score, spans));
                }
            }
            best.map(|(kind, score, spans)| MatchResult {
                entry_id: entry.id.clone(),
                score,
                kind,
                spans,
            })
        })
        .collect();

    // Kind tier dominates raw score, so a context bonus can reorder within
    // a tier but never across tiers. Stable sort keeps corpus order on ties.
    results.sort_by(|a, b| {
        b.kind
            .rank()
            .cmp(&a.kind.rank())
            .then(b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
    });

    log::debug!(
        "ranked {} of {} candidates for '{}'",
        results.len(),
        corpus.len(),
        trimmed
    );

    results
}

/// Score one target against the case-folded query. `None` means the target
/// does not match at all.
fn score_target(query: &[char], target: &str, params: &ScoreParams) -> Option<(MatchKind, f64, Vec<Span>)> {
    let target_chars: Vec<char> = target.chars().map(fold_char).collect();
    let q_len = query.len();
    let coverage = q_len as f64 / target_chars.len().max(1) as f64;

    if target_chars == query {
        return Some((
            MatchKind::Exact,
            params.exact_score,
            vec![Span::new(0, q_len)],
        ));
    }

    if target_chars.len() >= q_len && target_chars[..q_len] == *query {
        let score = params.prefix_base + coverage * params.prefix_coverage_weight;
        return Some((MatchKind::Prefix, score, vec![Span::new(0, q_len)]));
    }

    if let Some(pos) = find_substring(&target_chars, query) {
        let score = params.substring_base + coverage * params.substring_coverage_weight;
        return Some((MatchKind::Substring, score, vec![Span::new(pos, pos + q_len)]));
    }

    subsequence_score(query, &target_chars, params)
}

/// Greedy left-to-right subsequence match with a consecutive-run bonus.
/// Excludes the target when the query is not fully consumed or the blended
/// weight falls at or below the inclusion threshold.
fn subsequence_score(
    query: &[char],
    target: &[char],
    params: &ScoreParams,
) -> Option<(MatchKind, f64, Vec<Span>)> {
    let mut positions: Vec<usize> = Vec::with_capacity(query.len());
    let mut bonus = 0.0;
    let mut qi = 0;

    for (ti, &ch) in target.iter().enumerate() {
        if qi == query.len() {
            break;
        }
        if ch == query[qi] {
            if positions.last().is_some_and(|&prev| ti == prev + 1) {
                bonus += params.consecutive_increment;
            }
            positions.push(ti);
            qi += 1;
        }
    }

    if qi < query.len() {
        return None;
    }

    let consumed = positions.len() as f64;
    let weighted = consumed / query.len() as f64 * params.query_coverage_weight
        + consumed / target.len().max(1) as f64 * params.target_coverage_weight
        + bonus;
    if weighted <= params.fuzzy_threshold {
        return None;
    }

    Some((
        MatchKind::Fuzzy,
        weighted * params.fuzzy_scale,
        compress_spans(&positions),
    ))
}

/// First char offset of `needle` inside `haystack`, if any.
fn find_substring(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Collapse matched char positions into maximal `[start, end)` runs.
fn compress_spans(positions: &[usize]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    for &pos in positions {
        match spans.last_mut() {
            Some(span) if span.end == pos => span.end = pos + 1,
            _ => spans.push(Span::new(pos, pos + 1)),
        }
    }
    spans
}

/// Per-char case fold. `str::to_lowercase` can expand one char into
/// several (e.g. `İ`), which would shift highlight spans out of line with
/// the original target; folding char-by-char keeps offsets 1:1.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Text up to the first underscore, lowercased; used for context affinity.
fn leading_segment(name: &str) -> String {
    name.split('_').next().unwrap_or(name).to_lowercase()
}
