use crate::error::BenchResult;
use biodivine_lib_param_bn::{BooleanNetwork, RegulatoryGraph};
use std::fs;
use std::path::Path;

/// Loads a base model from its `.aeon` text.
pub fn load_network<P: AsRef<Path>>(path: P) -> BenchResult<BooleanNetwork> {
    let content = fs::read_to_string(path)?;
    Ok(BooleanNetwork::try_from(content.as_str())?)
}

/// Names of all network variables in variable order.
pub fn variable_names(network: &BooleanNetwork) -> Vec<String> {
    network
        .variables()
        .map(|id| network.get_variable_name(id).clone())
        .collect()
}

/// Copies the explicit parameters of `network` into `target`.
fn copy_parameters(network: &BooleanNetwork, target: &mut BooleanNetwork) -> BenchResult<()> {
    for id in network.parameters() {
        let parameter = network.get_parameter(id);
        target.add_parameter(parameter.get_name(), parameter.get_arity())?;
    }
    Ok(())
}

/// A copy of the network where no regulation is observable.
///
/// Perturbed graphs ignore observability, so benchmarks are generated from a
/// baseline without it to keep results comparable. Monotonicity, explicit
/// parameters and update functions are preserved.
pub fn clear_observability(network: &BooleanNetwork) -> BenchResult<BooleanNetwork> {
    let graph = network.as_graph();
    let mut new_graph = RegulatoryGraph::new(variable_names(network));
    for regulation in graph.regulations() {
        new_graph.add_regulation(
            graph.get_variable_name(regulation.get_regulator()),
            graph.get_variable_name(regulation.get_target()),
            false,
            regulation.get_monotonicity(),
        )?;
    }

    let mut result = BooleanNetwork::new(new_graph);
    copy_parameters(network, &mut result)?;
    for var in network.variables() {
        result.set_update_function(var, network.get_update_function(var).clone())?;
    }
    Ok(result)
}

/// Variables whose regulator count does not exceed `max_arity`.
pub fn erasure_candidates(network: &BooleanNetwork, max_arity: usize) -> Vec<String> {
    let graph = network.as_graph();
    network
        .variables()
        .filter(|var| graph.regulators(*var).len() <= max_arity)
        .map(|var| network.get_variable_name(var).clone())
        .collect()
}

/// A copy of the network where the listed variables have no update function,
/// i.e. their functions become free (implicit) parameters.
pub fn erase_functions(network: &BooleanNetwork, erase: &[String]) -> BenchResult<BooleanNetwork> {
    let mut result = BooleanNetwork::new(network.as_graph().clone());
    copy_parameters(network, &mut result)?;
    for var in network.variables() {
        if erase.contains(network.get_variable_name(var)) {
            continue;
        }
        result.set_update_function(var, network.get_update_function(var).clone())?;
    }
    Ok(result)
}

/// Number of variables without an explicit update function.
pub fn count_unknown_functions(network: &BooleanNetwork) -> usize {
    network
        .variables()
        .filter(|var| network.get_update_function(*var).is_none())
        .count()
}
