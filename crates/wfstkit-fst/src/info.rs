// Summary statistics for an automaton.

use std::fmt;

use serde::Serialize;
use wfstkit_core::{Semiring, StateId};

use crate::connect::{accessible_states, coaccessible_states};
use crate::fst::Fst;
use crate::properties::FstProperties;

/// Counts and properties of an automaton, as printed by `fst-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FstInfo {
    pub weight_type: String,
    pub start: Option<StateId>,
    pub num_states: usize,
    pub num_arcs: usize,
    pub num_final_states: usize,
    pub num_input_epsilons: usize,
    pub num_output_epsilons: usize,
    pub num_accessible: usize,
    pub num_coaccessible: usize,
    pub acceptor: bool,
    pub input_deterministic: bool,
    pub epsilons: bool,
    pub weighted: bool,
    pub properties: u64,
}

impl FstInfo {
    pub fn new<W: Semiring, F: Fst<W>>(fst: &F) -> Self {
        let mut num_arcs = 0;
        let mut num_final_states = 0;
        let mut num_input_epsilons = 0;
        let mut num_output_epsilons = 0;
        for state in fst.states() {
            if fst.is_final(state) {
                num_final_states += 1;
            }
            num_arcs += fst.num_arcs(state);
            num_input_epsilons += fst.num_input_epsilons(state);
            num_output_epsilons += fst.num_output_epsilons(state);
        }
        let props = FstProperties::compute(fst);
        Self {
            weight_type: W::weight_type().to_string(),
            start: fst.start(),
            num_states: fst.num_states(),
            num_arcs,
            num_final_states,
            num_input_epsilons,
            num_output_epsilons,
            num_accessible: accessible_states(fst).iter().filter(|&&b| b).count(),
            num_coaccessible: coaccessible_states(fst).iter().filter(|&&b| b).count(),
            acceptor: props.contains(FstProperties::ACCEPTOR),
            input_deterministic: props.contains(FstProperties::I_DETERMINISTIC),
            epsilons: props.contains(FstProperties::EPSILONS),
            weighted: props.contains(FstProperties::WEIGHTED),
            properties: props.bits(),
        }
    }
}

impl fmt::Display for FstInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yn = |b: bool| if b { "y" } else { "n" };
        let start = self
            .start
            .map_or_else(|| "none".to_string(), |s| s.to_string());
        writeln!(f, "{:<36}{}", "weight type", self.weight_type)?;
        writeln!(f, "{:<36}{}", "start state", start)?;
        writeln!(f, "{:<36}{}", "# of states", self.num_states)?;
        writeln!(f, "{:<36}{}", "# of arcs", self.num_arcs)?;
        writeln!(f, "{:<36}{}", "# of final states", self.num_final_states)?;
        writeln!(f, "{:<36}{}", "# of input epsilons", self.num_input_epsilons)?;
        writeln!(f, "{:<36}{}", "# of output epsilons", self.num_output_epsilons)?;
        writeln!(f, "{:<36}{}", "# of accessible states", self.num_accessible)?;
        writeln!(f, "{:<36}{}", "# of coaccessible states", self.num_coaccessible)?;
        writeln!(f, "{:<36}{}", "acceptor", yn(self.acceptor))?;
        writeln!(f, "{:<36}{}", "input deterministic", yn(self.input_deterministic))?;
        writeln!(f, "{:<36}{}", "epsilons", yn(self.epsilons))?;
        write!(f, "{:<36}{}", "weighted", yn(self.weighted))
    }
}
