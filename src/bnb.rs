use crate::canon::{canonicalize, Bound, BoundKind};
use crate::dual::DualSimplex;
use crate::error::SolveError;
use crate::model::{Model, OptDir};
use crate::primal::PrimalSimplex;
use crate::tableau::{fmt_cell, Tableau};
use crate::var::VarType;
use crate::{INT_EPS, ZERO_EPS};

use colored::Colorize;
use log::debug;

use std::collections::HashMap;
use std::fmt::Write as _;

/// One explored node of the branch-and-bound tree.
#[derive(Clone, Debug)]
pub struct BnbNode {
    /// Path-encoded identifier: `Root`, then `.1` (floor) / `.2` (ceil)
    /// segments down the tree.
    pub label: String,
    pub depth: usize,
    /// Bounds accumulated from the root to this node.
    pub bounds: Vec<Bound>,
    /// Decision-variable values of the LP relaxation.
    pub x: Vec<f64>,
    /// LP relaxation objective in the user's sense.
    pub objective: f64,
    pub is_integer: bool,
    pub infeasible: bool,
    pub solver_used: &'static str,
}

impl BnbNode {
    fn unsolved(label: String, depth: usize, bounds: Vec<Bound>) -> Self {
        Self {
            label,
            depth,
            bounds,
            x: Vec::new(),
            objective: 0.0_f64,
            is_integer: false,
            infeasible: false,
            solver_used: "",
        }
    }
}

/// Parent's final tableau plus the one bound the child introduces.
/// Consumed exactly once when the child is solved.
struct Seed {
    tableau: Tableau,
    bound: Bound,
}

pub struct BnbOutcome {
    /// Best integer-feasible point, keyed by variable name. Empty when no
    /// integer-feasible node was found.
    pub best_x: HashMap<String, f64>,
    pub best_objective: f64,
    pub feasible: bool,
    pub nodes_explored: usize,
    /// Human-readable per-node trace.
    pub log: String,
    /// Set when the search stopped on the node cap; the other fields still
    /// carry everything found up to that point.
    pub failure: Option<SolveError>,
}

/// Depth-first branch and bound over LP relaxations. Children inherit the
/// parent's final tableau through a warm start instead of rebuilding from
/// the model.
pub struct BranchAndBound {
    max_nodes: usize,
    max_iterations: usize,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self {
            max_nodes: 10_000,
            max_iterations: 10_000,
        }
    }
}

/// Iteration-0 of a child: the parent's final tableau with the new bound's
/// slack column inserted before the rhs and the bound row reduced against
/// the parent's basis. A negative new rhs is left for the dual simplex.
pub(crate) fn warm_start(parent: &Tableau, bound: &Bound) -> Tableau {
    let mut child = parent.clone();

    let mut coeffs = vec![0.0_f64; child.n_cols() - 1];
    let (coeff, rhs, tag) = match bound.kind {
        BoundKind::Upper => (1.0_f64, bound.value, "S"),
        BoundKind::Lower => (-1.0_f64, -bound.value, "E"),
    };
    coeffs[bound.var] = coeff;

    //the new row's constraint number is the child's row count
    let row_number = child.n_rows();
    child.grow(&coeffs, format!("{}{}", tag, row_number), rhs);
    child.price_out_last_row();
    child
}

fn integer_feasible(mdl: &Model, x: &[f64]) -> bool {
    mdl.vars().iter().zip(x).all(|(v, &xi)| match v.ty() {
        VarType::Integer => (xi - xi.round()).abs() < INT_EPS,
        VarType::Binary => {
            (xi - xi.round()).abs() < INT_EPS && xi >= -INT_EPS && xi <= 1.0_f64 + INT_EPS
        }
        _ => true,
    })
}

/// Most fractional integral variable; ties fall to the smallest index.
fn branch_var(mdl: &Model, x: &[f64]) -> Option<(usize, f64)> {
    let mut pick: Option<(usize, f64, f64)> = None;
    for (j, v) in mdl.vars().iter().enumerate() {
        if !v.ty().is_integral() {
            continue;
        }
        let frac = (x[j] - x[j].round()).abs();
        if frac < INT_EPS {
            continue;
        }
        match pick {
            Some((_, _, best)) if frac <= best => {}
            _ => pick = Some((j, x[j], frac)),
        }
    }
    pick.map(|(j, v, _)| (j, v))
}

fn fmt_x(x: &[f64]) -> String {
    let cells: Vec<String> = x.iter().map(|&v| fmt_cell(v)).collect();
    format!("[{}]", cells.join(", "))
}

impl BranchAndBound {
    pub fn new(max_nodes: usize, max_iterations: usize) -> Self {
        Self {
            max_nodes,
            max_iterations,
        }
    }

    /// Solve one node's LP relaxation, from its seed when it has one and
    /// from a fresh canonical tableau otherwise.
    fn solve_node(
        &self,
        mdl: &Model,
        bounds: &[Bound],
        seed: Option<Seed>,
    ) -> Result<(Tableau, Vec<f64>, f64, &'static str), SolveError> {
        let mut tbl = match seed {
            Some(seed) => warm_start(&seed.tableau, &seed.bound),
            None => Tableau::from_canon(&canonicalize(mdl, bounds)?),
        };

        //node-local handling only needs the failure kind, not the history
        let mut solver_used = "Primal";
        if !tbl.rhs_feasible() {
            DualSimplex::new(self.max_iterations)
                .solve(&mut tbl)
                .map_err(|failure| failure.error)?;
            solver_used = "Dual+Primal";
        }
        PrimalSimplex::new(self.max_iterations)
            .solve(&mut tbl)
            .map_err(|failure| failure.error)?;

        //user-space values, objective against the original coefficients
        let mut x = tbl.x_values();
        for (xi, v) in x.iter_mut().zip(mdl.vars()) {
            if v.ty() == VarType::Negative {
                *xi = -*xi;
            }
        }
        let objective = mdl
            .vars()
            .iter()
            .zip(&x)
            .map(|(v, xi)| v.obj_coeff() * xi)
            .sum();

        Ok((tbl, x, objective, solver_used))
    }

    pub fn solve(&self, mdl: &Model) -> Result<BnbOutcome, SolveError> {
        mdl.validate()?;

        let mut nodes = vec![BnbNode::unsolved("Root".to_string(), 0, Vec::new())];
        let mut seeds: Vec<Option<Seed>> = vec![None];
        let mut pending: Vec<usize> = vec![0];

        let mut best: Option<(Vec<f64>, f64)> = None;
        let mut explored = 0;
        let mut log = String::new();
        let mut failure = None;

        while let Some(id) = pending.pop() {
            if explored >= self.max_nodes {
                //cap reached: stop searching but keep everything found
                writeln!(log, "node cap of {} reached; stopping", self.max_nodes).unwrap();
                failure = Some(SolveError::IterationCap {
                    limit: self.max_nodes,
                });
                break;
            }
            explored += 1;

            let seed = seeds[id].take();
            let label = nodes[id].label.clone();
            let bounds = nodes[id].bounds.clone();

            let (final_tbl, x, objective, solver_used) =
                match self.solve_node(mdl, &bounds, seed) {
                    Ok(solved) => solved,
                    Err(err) => {
                        //node-local failure: mark and move on
                        nodes[id].infeasible = true;
                        nodes[id].solver_used = "none";
                        writeln!(log, "{}: {}", label, format!("infeasible ({})", err).red())
                            .unwrap();
                        debug!("node {} infeasible: {}", label, err);
                        continue;
                    }
                };

            nodes[id].x = x.clone();
            nodes[id].objective = objective;
            nodes[id].solver_used = solver_used;

            let is_integer = integer_feasible(mdl, &x);
            nodes[id].is_integer = is_integer;

            if is_integer {
                let improves = match &best {
                    None => true,
                    Some((_, best_obj)) => match mdl.opt_dir() {
                        OptDir::Max => objective > best_obj + ZERO_EPS,
                        OptDir::Min => objective < best_obj - ZERO_EPS,
                    },
                };
                if improves {
                    best = Some((x.clone(), objective));
                    writeln!(
                        log,
                        "{}: z = {}, x = {} -> {}",
                        label,
                        fmt_cell(objective),
                        fmt_x(&x),
                        "candidate (new incumbent)".green()
                    )
                    .unwrap();
                } else {
                    writeln!(
                        log,
                        "{}: z = {}, x = {} -> candidate",
                        label,
                        fmt_cell(objective),
                        fmt_x(&x)
                    )
                    .unwrap();
                }
                continue;
            }

            //bound pruning against the incumbent
            if let Some((_, best_obj)) = &best {
                let worse = match mdl.opt_dir() {
                    OptDir::Max => objective <= best_obj + ZERO_EPS,
                    OptDir::Min => objective >= best_obj - ZERO_EPS,
                };
                if worse {
                    writeln!(
                        log,
                        "{}: z = {}, x = {} -> pruned by bound",
                        label,
                        fmt_cell(objective),
                        fmt_x(&x)
                    )
                    .unwrap();
                    continue;
                }
            }

            let (j, value) = match branch_var(mdl, &x) {
                Some(pick) => pick,
                //integral within INT_EPS yet not flagged: nothing to branch
                None => continue,
            };

            writeln!(
                log,
                "{}: z = {}, x = {} -> branch on {} (floor {} / ceil {})",
                label,
                fmt_cell(objective),
                fmt_x(&x),
                mdl.vars()[j].name(),
                value.floor(),
                value.ceil()
            )
            .unwrap();

            //ceil child first so the floor branch is explored next
            let children = [
                (".2", Bound::lower(j, value.ceil())),
                (".1", Bound::upper(j, value.floor())),
            ];
            for (suffix, bound) in children {
                let mut child_bounds = bounds.clone();
                child_bounds.push(bound);
                nodes.push(BnbNode::unsolved(
                    format!("{}{}", label, suffix),
                    nodes[id].depth + 1,
                    child_bounds,
                ));
                seeds.push(Some(Seed {
                    tableau: final_tbl.clone(),
                    bound,
                }));
                pending.push(nodes.len() - 1);
            }
        }

        let feasible = best.is_some();
        let (best_x, best_objective) = match best {
            Some((x, z)) => {
                let map = mdl
                    .var_names()
                    .into_iter()
                    .zip(x)
                    .collect::<HashMap<String, f64>>();
                (map, z)
            }
            None => (HashMap::new(), 0.0_f64),
        };

        Ok(BnbOutcome {
            best_x,
            best_objective,
            feasible,
            nodes_explored: explored,
            log,
            failure,
        })
    }
}
