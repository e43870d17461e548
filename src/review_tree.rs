use std::collections::{HashMap, HashSet};

use crate::{entities::review, models::ReviewNode};

/// Arranges a movie's reviews into a forest: parentless reviews at the root,
/// replies nested under their parent. Rows are expected in id order and keep
/// that order within each level.
///
/// Malformed parent links degrade instead of recursing without bound: a
/// parent id that does not resolve within the set (deleted row, self
/// reference) promotes the review to the root, and a visited set drops any
/// row that would be rendered twice.
pub fn build(reviews: &[review::Model]) -> Vec<ReviewNode> {
    let ids: HashSet<i32> = reviews.iter().map(|r| r.id).collect();

    let mut children: HashMap<i32, Vec<&review::Model>> = HashMap::new();
    let mut roots: Vec<&review::Model> = Vec::new();
    for review in reviews {
        match review.parent_id {
            Some(parent) if parent != review.id && ids.contains(&parent) => {
                children.entry(parent).or_default().push(review);
            },
            _ => roots.push(review),
        }
    }

    let mut visited = HashSet::new();
    roots.iter().filter_map(|r| to_node(r, &children, &mut visited)).collect()
}

fn to_node(
    review: &review::Model,
    children: &HashMap<i32, Vec<&review::Model>>,
    visited: &mut HashSet<i32>,
) -> Option<ReviewNode> {
    if !visited.insert(review.id) {
        return None;
    }

    let child_nodes = children
        .get(&review.id)
        .map(|kids| kids.iter().filter_map(|k| to_node(k, children, visited)).collect())
        .unwrap_or_default();

    Some(ReviewNode {
        id: review.id,
        name: review.name.clone(),
        text: review.text.clone(),
        children: child_nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: i32, parent_id: Option<i32>) -> review::Model {
        review::Model {
            id,
            email: format!("user{id}@example.com"),
            name: format!("user{id}"),
            text: format!("review {id}"),
            parent_id,
            movie_id: 1,
        }
    }

    #[test]
    fn nests_a_reply_chain_under_a_single_root() {
        let rows = vec![review(1, None), review(2, Some(1)), review(3, Some(2))];

        let forest = build(&rows);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, 1);
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].id, 2);
        assert_eq!(forest[0].children[0].children.len(), 1);
        assert_eq!(forest[0].children[0].children[0].id, 3);
        assert!(forest[0].children[0].children[0].children.is_empty());
    }

    #[test]
    fn keeps_sibling_order_by_id() {
        let rows = vec![review(1, None), review(2, Some(1)), review(3, Some(1)), review(4, None)];

        let forest = build(&rows);

        assert_eq!(forest.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(forest[0].children.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn dangling_parent_promotes_the_reply_to_the_root() {
        let rows = vec![review(1, None), review(2, Some(99))];

        let forest = build(&rows);

        assert_eq!(forest.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn self_reference_terminates() {
        let rows = vec![review(1, Some(1))];

        let forest = build(&rows);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, 1);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn mutual_cycle_terminates() {
        // Neither row is a root, so a malformed two-cycle renders as nothing
        // rather than looping.
        let rows = vec![review(1, Some(2)), review(2, Some(1))];

        assert!(build(&rows).is_empty());
    }
}
