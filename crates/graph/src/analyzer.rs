use crate::types::{CycleReport, DependencyNode};
use std::collections::HashSet;

/// Probe for a reference cycle reachable from `start`.
///
/// Depth-first walk holding the current path as an explicit stack: meeting
/// a name already on that stack is a cycle, reported with the repeated name
/// at both ends of the segment. A name beyond `max_depth`, or one already
/// expanded earlier in this probe (shared descendant in a DAG), is cut off
/// without being treated as a cycle.
pub fn detect_cycle<F>(start: &str, edges_of: F, max_depth: usize) -> CycleReport
where
    F: Fn(&str) -> Vec<String>,
{
    let mut path: Vec<String> = Vec::new();
    let mut expanded: HashSet<String> = HashSet::new();
    let mut truncated = false;

    if let Some(cycle) = walk(start, &edges_of, max_depth, &mut path, &mut expanded, &mut truncated) {
        log::debug!("cycle via '{start}': {}", cycle.join(" -> "));
        return CycleReport {
            circular: true,
            path: cycle,
            truncated,
        };
    }
    CycleReport::acyclic(truncated)
}

fn walk<F>(
    name: &str,
    edges_of: &F,
    max_depth: usize,
    path: &mut Vec<String>,
    expanded: &mut HashSet<String>,
    truncated: &mut bool,
) -> Option<Vec<String>>
where
    F: Fn(&str) -> Vec<String>,
{
    if let Some(pos) = path.iter().position(|n| n == name) {
        let mut cycle: Vec<String> = path[pos..].to_vec();
        cycle.push(name.to_string());
        return Some(cycle);
    }
    if path.len() >= max_depth || !expanded.insert(name.to_string()) {
        *truncated = true;
        return None;
    }

    path.push(name.to_string());
    for child in edges_of(name) {
        if let Some(cycle) = walk(&child, edges_of, max_depth, path, expanded, truncated) {
            return Some(cycle);
        }
    }
    path.pop();
    None
}

/// Build the dependency tree under `start` for display, using the same
/// depth and revisit bounds as [`detect_cycle`]. A node on the current
/// path (a cycle member) is emitted as a truncated leaf rather than
/// expanded forever.
pub fn build_tree<F>(start: &str, edges_of: F, max_depth: usize) -> DependencyNode
where
    F: Fn(&str) -> Vec<String>,
{
    let mut path: Vec<String> = Vec::new();
    let mut expanded: HashSet<String> = HashSet::new();
    grow(start, &edges_of, max_depth, &mut path, &mut expanded)
}

fn grow<F>(
    name: &str,
    edges_of: &F,
    max_depth: usize,
    path: &mut Vec<String>,
    expanded: &mut HashSet<String>,
) -> DependencyNode
where
    F: Fn(&str) -> Vec<String>,
{
    let on_path = path.iter().any(|n| n == name);
    if on_path || path.len() >= max_depth || !expanded.insert(name.to_string()) {
        return DependencyNode {
            name: name.to_string(),
            children: Vec::new(),
            truncated: true,
        };
    }

    path.push(name.to_string());
    let children = edges_of(name)
        .iter()
        .map(|child| grow(child, edges_of, max_depth, path, expanded))
        .collect();
    path.pop();

    DependencyNode {
        name: name.to_string(),
        children,
        truncated: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn edges(pairs: &[(&str, &[&str])]) -> impl Fn(&str) -> Vec<String> {
        let map: HashMap<String, Vec<String>> = pairs
            .iter()
            .map(|(k, vs)| {
                (
                    k.to_string(),
                    vs.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();
        move |name: &str| map.get(name).cloned().unwrap_or_default()
    }

    #[test]
    fn triangle_reports_cycle_with_closed_path() {
        let edges = edges(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]);
        let report = detect_cycle("A", edges, 16);
        assert!(report.circular);
        assert_eq!(report.path, vec!["A", "B", "C", "A"]);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let edges = edges(&[("A", &["A"])]);
        let report = detect_cycle("A", edges, 16);
        assert!(report.circular);
        assert_eq!(report.path, vec!["A", "A"]);
    }

    #[test]
    fn acyclic_chain_is_normal() {
        let edges = edges(&[("A", &["B"]), ("B", &["C"])]);
        let report = detect_cycle("A", edges, 16);
        assert!(!report.circular);
        assert!(report.path.is_empty());
        assert!(!report.truncated);
    }

    #[test]
    fn depth_bound_truncates_instead_of_looping() {
        let edges = edges(&[
            ("A", &["B"]),
            ("B", &["C"]),
            ("C", &["D"]),
            ("D", &["E"]),
        ]);
        let report = detect_cycle("A", edges, 3);
        assert!(!report.circular);
        assert!(report.truncated);
    }

    #[test]
    fn cycle_beyond_depth_bound_is_not_reported() {
        let edges = edges(&[
            ("A", &["B"]),
            ("B", &["C"]),
            ("C", &["D"]),
            ("D", &["B"]),
        ]);
        // The back-edge D -> B sits at depth 3; with max_depth 3, D is
        // never expanded, so the probe truncates without claiming a cycle.
        let report = detect_cycle("A", edges, 3);
        assert!(!report.circular);
        assert!(report.truncated);
    }

    #[test]
    fn shared_descendants_are_expanded_once() {
        use std::cell::RefCell;
        let calls = RefCell::new(Vec::new());
        let edges = |name: &str| {
            calls.borrow_mut().push(name.to_string());
            match name {
                "A" => vec!["B".to_string(), "C".to_string()],
                "B" | "C" => vec!["D".to_string()],
                "D" => vec![],
                _ => vec![],
            }
        };
        let report = detect_cycle("A", edges, 16);
        assert!(!report.circular);
        // D is reachable through both B and C but only expanded once.
        let d_expansions = calls.borrow().iter().filter(|n| *n == "D").count();
        assert_eq!(d_expansions, 1);
        assert!(report.truncated);
    }

    #[test]
    fn tree_truncates_at_depth_bound() {
        let edges = edges(&[
            ("A", &["B"]),
            ("B", &["C"]),
            ("C", &["D"]),
            ("D", &["E"]),
        ]);
        let tree = build_tree("A", edges, 3);
        let b = &tree.children[0];
        let c = &b.children[0];
        let d = &c.children[0];
        assert_eq!(d.name, "D");
        assert!(d.truncated);
        assert!(d.children.is_empty());
        assert!(!c.truncated);
    }

    #[test]
    fn tree_marks_cycle_member_as_truncated_leaf() {
        let edges = edges(&[("A", &["B"]), ("B", &["A"])]);
        let tree = build_tree("A", edges, 16);
        assert_eq!(tree.name, "A");
        let b = &tree.children[0];
        let back = &b.children[0];
        assert_eq!(back.name, "A");
        assert!(back.truncated);
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn missing_node_yields_single_leaf() {
        let edges = edges(&[]);
        let tree = build_tree("ghost", edges, 8);
        assert_eq!(tree, DependencyNode::leaf("ghost"));
    }
}
