use crate::{find_dangling, purge, revert, synthesize, Result, RevertReport, SweepReport, SynthReport};
use lanefix_graph::{ConnectorTable, EntityGraph};
use lanefix_savefile::{restore_entity_container, take_entity_container};
use serde::Serialize;
use serde_json::Value;

/// Which transformation a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Repair,
    Revert,
}

/// Everything one run counted. Identical for dry runs and apply runs; only
/// persistence differs, and that is the caller's decision.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct RunReport {
    pub sweep: Option<SweepReport>,
    pub synth: Option<SynthReport>,
    pub revert: Option<RevertReport>,
}

/// Run the full transformation over a decoded archive document, in place.
///
/// Takes the entity container and connector side-table out of the document,
/// threads the graph through the phases, and puts both back. Structural
/// problems (no entity container) surface before anything is touched.
pub fn run(document: &mut Value, mode: Mode) -> Result<RunReport> {
    let (container_path, container) = take_entity_container(document)?;
    let mut connectors = ConnectorTable::take_from(document);
    let mut graph = EntityGraph::from_container(container);
    log::info!("entity graph: {} entities", graph.len());

    let mut report = RunReport::default();
    match mode {
        Mode::Repair => {
            let dangling = find_dangling(&graph)?;
            report.sweep = Some(purge(&mut graph, &mut connectors, &dangling));
            report.synth = Some(synthesize(&mut graph)?);
        }
        Mode::Revert => {
            report.revert = Some(revert(&mut graph, &mut connectors)?);
        }
    }

    connectors.restore(document);
    restore_entity_container(document, &container_path, graph.into_container());
    Ok(report)
}
