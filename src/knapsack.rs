use crate::constraint::Comp;
use crate::model::{Model, OptDir};
use crate::var::VarType;
use crate::ZERO_EPS;

use log::debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KnapsackStatus {
    Unsolved,
    /// Solved with a fractional pivot variable, not yet branched.
    Unbranched,
    Branched,
    /// Solved with an all-integer greedy fill.
    Candidate,
    Infeasible,
}

/// One node of the knapsack search tree. `fixed[j]` records a 0/1 decision
/// made on the path from the root; unfixed variables are filled greedily in
/// ratio order when the node is solved.
#[derive(Clone, Debug)]
pub struct KnapsackNode {
    pub label: String,
    pub parent: String,
    pub status: KnapsackStatus,
    pub fixed: Vec<Option<u8>>,
    /// The variable that only partially fit, if any.
    pub frac_var: Option<usize>,
    pub x: Vec<f64>,
    pub objective: f64,
    pub weight_used: f64,
    /// Unfixed variables in the order the greedy fill visited them.
    pub decision_order: Vec<usize>,
    /// Ratio ranking snapshot used at solve time.
    pub rank: Vec<usize>,
}

impl KnapsackNode {
    fn unsolved(label: String, parent: String, fixed: Vec<Option<u8>>) -> Self {
        Self {
            label,
            parent,
            status: KnapsackStatus::Unsolved,
            fixed,
            frac_var: None,
            x: Vec::new(),
            objective: 0.0_f64,
            weight_used: 0.0_f64,
            decision_order: Vec::new(),
            rank: Vec::new(),
        }
    }
}

pub struct KnapsackOutcome {
    pub nodes: Vec<KnapsackNode>,
    pub best_candidate: Option<KnapsackNode>,
    /// Why the model is not a 0/1 knapsack, when it is not. Always data,
    /// never an error.
    pub not_applicable: Option<String>,
}

/// Branch and bound specialized to the 0/1 knapsack: one `<=` capacity row
/// over binary variables, with the LP relaxation solved by a greedy fill in
/// profit/weight ratio order.
pub struct BnbKnapsack {
    max_nodes: usize,
}

impl Default for BnbKnapsack {
    fn default() -> Self {
        Self { max_nodes: 10_000 }
    }
}

fn applicability(mdl: &Model) -> Option<String> {
    if mdl.opt_dir() != OptDir::Max {
        return Some("objective must be maximization".to_string());
    }
    if mdl.constraints().len() != 1 {
        return Some(format!(
            "expected exactly one capacity constraint, found {}",
            mdl.constraints().len()
        ));
    }
    let capacity_row = &mdl.constraints()[0];
    if capacity_row.comp() != Comp::Le {
        return Some("capacity constraint must be \u{2264}".to_string());
    }
    if capacity_row.coeffs().len() != mdl.n_vars() {
        return Some("capacity row length does not match the variable count".to_string());
    }
    if mdl.vars().iter().any(|v| v.ty() != VarType::Binary) {
        return Some("all decision variables must be binary".to_string());
    }
    if capacity_row.rhs() < 0.0_f64 || capacity_row.coeffs().iter().any(|&w| w < 0.0_f64) {
        return Some("weights and capacity must be non-negative".to_string());
    }
    None
}

fn ratio(profit: f64, weight: f64) -> f64 {
    if weight.abs() < ZERO_EPS {
        f64::INFINITY
    } else {
        profit / weight
    }
}

/// Variables by descending profit/weight ratio; zero weights rank first and
/// ties keep the original order.
fn rank_by_ratio(profits: &[f64], weights: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..profits.len()).collect();
    order.sort_by(|&a, &b| {
        ratio(profits[b], weights[b])
            .partial_cmp(&ratio(profits[a], weights[a]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Greedy LP relaxation under the node's fixed decisions.
fn solve_node(node: &mut KnapsackNode, profits: &[f64], weights: &[f64], capacity: f64, order: &[usize]) {
    node.rank = order.to_vec();

    let n = profits.len();
    let mut x = vec![0.0_f64; n];
    let mut cap_left = capacity;

    for (j, fixed) in node.fixed.iter().enumerate() {
        if let Some(v) = fixed {
            x[j] = *v as f64;
            if *v == 1 {
                cap_left -= weights[j];
            }
        }
    }
    if cap_left < -ZERO_EPS {
        node.x = x;
        node.weight_used = capacity - cap_left;
        node.status = KnapsackStatus::Infeasible;
        return;
    }

    for &j in order {
        if node.fixed[j].is_some() {
            continue;
        }
        node.decision_order.push(j);

        if weights[j] <= cap_left + ZERO_EPS {
            x[j] = 1.0_f64;
            cap_left -= weights[j];
        } else if cap_left > ZERO_EPS {
            //partial fit: everything after this reads zero
            x[j] = cap_left / weights[j];
            node.frac_var = Some(j);
            cap_left = 0.0_f64;
            break;
        }
        //else: capacity exhausted, leave at zero
    }

    node.objective = profits.iter().zip(&x).map(|(p, xi)| p * xi).sum();
    node.weight_used = weights.iter().zip(&x).map(|(w, xi)| w * xi).sum();
    node.x = x;
    node.status = if node.frac_var.is_some() {
        KnapsackStatus::Unbranched
    } else {
        KnapsackStatus::Candidate
    };
}

impl BnbKnapsack {
    pub fn new(max_nodes: usize) -> Self {
        Self { max_nodes }
    }

    pub fn solve(&self, mdl: &Model) -> KnapsackOutcome {
        if let Some(reason) = applicability(mdl) {
            return KnapsackOutcome {
                nodes: Vec::new(),
                best_candidate: None,
                not_applicable: Some(reason),
            };
        }

        let profits = mdl.obj_coeffs();
        let weights = mdl.constraints()[0].coeffs().to_vec();
        let capacity = mdl.constraints()[0].rhs();
        let order = rank_by_ratio(&profits, &weights);

        let mut nodes = vec![KnapsackNode::unsolved(
            "Root".to_string(),
            String::new(),
            vec![None; profits.len()],
        )];
        let mut pending: Vec<usize> = vec![0];

        while let Some(id) = pending.pop() {
            solve_node(&mut nodes[id], &profits, &weights, capacity, &order);
            debug!(
                "knapsack node {}: {:?}, z = {}",
                nodes[id].label, nodes[id].status, nodes[id].objective
            );

            let frac_var = match (nodes[id].status, nodes[id].frac_var) {
                (KnapsackStatus::Unbranched, Some(j)) => j,
                _ => continue,
            };

            if nodes.len() + 2 > self.max_nodes {
                break;
            }

            //`.1` fixes the pivot to 0, `.2` to 1; the zero branch pops first
            let label = nodes[id].label.clone();
            for (suffix, value) in [(".2", 1_u8), (".1", 0_u8)] {
                let mut fixed = nodes[id].fixed.clone();
                fixed[frac_var] = Some(value);
                nodes.push(KnapsackNode::unsolved(
                    format!("{}{}", label, suffix),
                    label.clone(),
                    fixed,
                ));
                pending.push(nodes.len() - 1);
            }
            nodes[id].status = KnapsackStatus::Branched;
        }

        let best_candidate = nodes
            .iter()
            .filter(|n| n.status == KnapsackStatus::Candidate)
            .fold(None::<KnapsackNode>, |best, n| match best {
                Some(b) if n.objective <= b.objective => Some(b),
                _ => Some(n.clone()),
            });

        KnapsackOutcome {
            nodes,
            best_candidate,
            not_applicable: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::var::Variable;

    use approx::assert_relative_eq;

    fn textbook_knapsack() -> Model {
        //capacity 40, profits [2,3,3,5,2,4], weights [11,8,6,14,10,10]
        let mut mdl = Model::new(OptDir::Max);
        for (i, p) in [2, 3, 3, 5, 2, 4].iter().enumerate() {
            mdl.add_var(Variable::binary(format!("x{}", i + 1), *p));
        }
        mdl.add_constraint(Constraint::new(
            vec![11.0, 8.0, 6.0, 14.0, 10.0, 10.0],
            Comp::Le,
            40,
        ));
        mdl
    }

    #[test]
    fn solves_textbook_instance() {
        let outcome = BnbKnapsack::default().solve(&textbook_knapsack());

        assert!(outcome.not_applicable.is_none());
        let best = outcome.best_candidate.expect("candidate expected");

        assert_relative_eq!(best.objective, 15.0, epsilon = 1e-6);
        assert!(best.weight_used <= 40.0 + 1e-6);
        for v in &best.x {
            assert!(*v == 0.0 || *v == 1.0);
        }
        //every candidate in the tree is integral
        assert!(outcome
            .nodes
            .iter()
            .filter(|n| n.status == KnapsackStatus::Candidate)
            .all(|n| n.x.iter().all(|v| (v - v.round()).abs() < 1e-6)));
    }

    #[test]
    fn root_relaxation_is_greedy_in_ratio_order() {
        let mdl = textbook_knapsack();
        let outcome = BnbKnapsack::default().solve(&mdl);
        let root = &outcome.nodes[0];

        //ratios: x3 = .5, x6 = .4, x2 = .375, x4 = .357, x5 = .2, x1 = .18
        assert_eq!(root.rank, vec![2, 5, 1, 3, 4, 0]);
        assert_eq!(root.status, KnapsackStatus::Branched);
        assert_eq!(root.frac_var, Some(4));
        assert_relative_eq!(root.objective, 15.4, epsilon = 1e-6);
        assert_relative_eq!(root.x[4], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn zero_weight_items_rank_first() {
        let order = rank_by_ratio(&[1.0, 5.0, 3.0], &[2.0, 4.0, 0.0]);
        assert_eq!(order[0], 2);
    }

    #[test]
    fn overfixed_nodes_are_infeasible() {
        let mut node = KnapsackNode::unsolved(
            "Root.2".to_string(),
            "Root".to_string(),
            vec![Some(1), Some(1)],
        );
        solve_node(&mut node, &[1.0, 1.0], &[3.0, 3.0], 5.0, &[0, 1]);
        assert_eq!(node.status, KnapsackStatus::Infeasible);
    }

    #[test]
    fn not_applicable_cases_return_data() {
        //minimization
        let mut mdl = Model::new(OptDir::Min);
        mdl.add_var(Variable::binary("x1", 1));
        mdl.add_constraint(Constraint::new(vec![1.0], Comp::Le, 1));
        let outcome = BnbKnapsack::default().solve(&mdl);
        assert!(outcome.not_applicable.is_some());
        assert!(outcome.nodes.is_empty());

        //non-binary variable
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::integer("x1", 1));
        mdl.add_constraint(Constraint::new(vec![1.0], Comp::Le, 1));
        assert!(BnbKnapsack::default()
            .solve(&mdl)
            .not_applicable
            .is_some());

        //two constraints
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::binary("x1", 1));
        mdl.add_constraint(Constraint::new(vec![1.0], Comp::Le, 1));
        mdl.add_constraint(Constraint::new(vec![1.0], Comp::Le, 2));
        assert!(BnbKnapsack::default()
            .solve(&mdl)
            .not_applicable
            .is_some());

        //negative weight
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::binary("x1", 1));
        mdl.add_constraint(Constraint::new(vec![-1.0], Comp::Le, 1));
        assert!(BnbKnapsack::default()
            .solve(&mdl)
            .not_applicable
            .is_some());

        //wrong relation
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::binary("x1", 1));
        mdl.add_constraint(Constraint::new(vec![1.0], Comp::Ge, 1));
        assert!(BnbKnapsack::default()
            .solve(&mdl)
            .not_applicable
            .is_some());
    }
}
