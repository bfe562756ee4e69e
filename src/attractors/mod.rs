use biodivine_lib_param_bn::biodivine_std::bitvector::ArrayBitVector;
use biodivine_lib_param_bn::biodivine_std::traits::Set;
use biodivine_lib_param_bn::symbolic_async_graph::{GraphColoredVertices, SymbolicAsyncGraph};
use biodivine_lib_param_bn::VariableId;
use log::{debug, trace};

/// Default limit on the BDD size of intermediate results when counting colours.
pub const DEFAULT_SYMBOLIC_SIZE_BOUND: usize = 1_000_000;

fn fwd_saturation(graph: &SymbolicAsyncGraph, initial: &GraphColoredVertices) -> GraphColoredVertices {
    let mut result = initial.clone();
    let rev_variables = graph.variables().rev().collect::<Vec<_>>();

    'from_bottom_var: loop {
        for var in rev_variables.iter() {
            let step = graph.var_post(*var, &result).minus(&result);
            if !step.is_empty() {
                result = result.union(&step);
                continue 'from_bottom_var;
            }
        }
        break result;
    }
}

fn bwd_saturation(graph: &SymbolicAsyncGraph, initial: &GraphColoredVertices) -> GraphColoredVertices {
    let mut result = initial.clone();
    let rev_variables = graph.variables().rev().collect::<Vec<_>>();

    'from_bottom_var: loop {
        for var in rev_variables.iter() {
            let step = graph.var_pre(*var, &result).minus(&result);
            if !step.is_empty() {
                result = result.union(&step);
                continue 'from_bottom_var;
            }
        }
        break result;
    }
}

/// Picks one state from every attractor discovered by pivot-based
/// forward/backward saturation.
///
/// Each pivot set holds one vertex per colour. A colour in which the forward
/// set of the pivot is contained in its backward set has the pivot inside a
/// bottom SCC. The backward set is then removed from the universe, which never
/// removes an attractor that was not yet discovered. For coloured networks,
/// attractors that only exist in some colours may share a representative
/// state, so not every attractor of every colour is guaranteed to be covered.
pub fn sample_attractor_seeds(graph: &SymbolicAsyncGraph) -> Vec<ArrayBitVector> {
    let mut seeds: Vec<ArrayBitVector> = Vec::new();
    let mut universe = graph.mk_unit_colored_vertices();

    while !universe.is_empty() {
        let pivot = universe.pick_vertex();
        let fwd = fwd_saturation(graph, &pivot);
        let bwd = bwd_saturation(graph, &pivot);

        let escaping = fwd.minus(&bwd).colors();
        let bottom_colors = pivot.colors().minus(&escaping);
        if !bottom_colors.is_empty() {
            let attractor = fwd.intersect_colors(&bottom_colors);
            if let Some(state) = attractor.pick_vertex().vertices().materialize().iter().next() {
                trace!("Found attractor represented by {:?}.", state);
                if !seeds.contains(&state) {
                    seeds.push(state);
                }
            }
        }

        universe = universe.minus(&bwd);
    }

    debug!("Sampled {} attractor seed(s).", seeds.len());
    seeds
}

/// Counts the colours in which `seed` lies inside an attractor.
///
/// First computes every state that can reach the seed, then grows the seed
/// forward while dropping each colour in which some successor leaves that
/// backward set. Returns `None` as soon as an intermediate result exceeds
/// `bound` BDD nodes.
pub fn count_attractor_colors(
    graph: &SymbolicAsyncGraph,
    seed: &ArrayBitVector,
    bound: usize,
) -> Option<f64> {
    let variables: Vec<VariableId> = graph.variables().rev().collect();
    let seed = graph.vertex(seed);

    let mut bwd = seed.clone();
    loop {
        let mut done = true;
        for var in variables.iter() {
            let step = graph.var_pre(*var, &bwd);
            if !step.is_subset(&bwd) {
                bwd = bwd.union(&step);
                done = false;
                break;
            }
        }
        if done {
            break;
        }
        if bwd.symbolic_size() > bound {
            debug!(
                "Backward set exceeded the bound ({} > {}).",
                bwd.symbolic_size(),
                bound
            );
            return None;
        }
    }

    let mut attractor = seed;
    loop {
        let mut done = true;
        for var in variables.iter() {
            let step = graph.var_post(*var, &attractor);
            if !step.is_subset(&attractor) {
                let bad_colors = step.minus(&bwd).colors();
                attractor = attractor.union(&step).minus_colors(&bad_colors);
                done = false;
                break;
            }
        }
        if done {
            let colors = attractor.colors().approx_cardinality();
            trace!("Seed is an attractor state in {} colour(s).", colors);
            return Some(colors);
        }
        if attractor.symbolic_size() > bound {
            debug!(
                "Attractor set exceeded the bound ({} > {}).",
                attractor.symbolic_size(),
                bound
            );
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biodivine_lib_param_bn::biodivine_std::bitvector::BitVector;
    use biodivine_lib_param_bn::BooleanNetwork;

    // Two stable states: (a, b) = (1, 0) and (0, 1).
    const TOGGLE: &str = r"
        a -| b
        b -| a
        $a: !b
        $b: !a
    ";

    fn graph(model: &str) -> SymbolicAsyncGraph {
        let network = BooleanNetwork::try_from(model).unwrap();
        SymbolicAsyncGraph::new(&network).unwrap()
    }

    #[test]
    fn toggle_switch_has_two_seeds() {
        let graph = graph(TOGGLE);
        let mut seeds = sample_attractor_seeds(&graph)
            .into_iter()
            .map(|s| s.values())
            .collect::<Vec<_>>();
        seeds.sort();
        assert_eq!(seeds, vec![vec![false, true], vec![true, false]]);
    }

    #[test]
    fn fixed_point_is_attractor_in_its_only_colour() {
        let graph = graph(TOGGLE);
        let seed = ArrayBitVector::from(vec![true, false]);
        assert_eq!(count_attractor_colors(&graph, &seed, 1_000), Some(1.0));
    }

    #[test]
    fn transient_state_has_no_colours() {
        let graph = graph(TOGGLE);
        let seed = ArrayBitVector::from(vec![true, true]);
        assert_eq!(count_attractor_colors(&graph, &seed, 1_000), Some(0.0));
    }

    #[test]
    fn erased_function_multiplies_colours() {
        // With `b` free over an unconstrained regulation there are four colours.
        // (1, 0) is a fixed point for f_b = false and f_b = !a, and lies on the
        // attractor cycle for f_b = a.
        let graph = graph(
            r"
            a -?? b
            b -| a
            $a: !b
        ",
        );
        let seed = ArrayBitVector::from(vec![true, false]);
        let count = count_attractor_colors(&graph, &seed, 1_000).unwrap();
        assert!(count >= 2.0);
        assert!(count < graph.unit_colors().approx_cardinality());
    }

    #[test]
    fn exceeded_bound_gives_unknown() {
        let graph = graph(TOGGLE);
        let seed = ArrayBitVector::from(vec![true, false]);
        assert_eq!(count_attractor_colors(&graph, &seed, 0), None);
    }
}
