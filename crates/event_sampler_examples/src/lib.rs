#![forbid(unsafe_code)]
//! Shared pieces for the executable examples: a small mass-action reaction network and
//! command-line helpers.
use anyhow::Context;
use event_sampler::prelude::*;
use rand::RngExt;

/// One mass-action reaction.
#[derive(Debug, Clone)]
pub struct Reaction {
    pub rate: f64,
    /// Species consumed, one entry per molecule.
    pub reactants: Vec<usize>,
    /// Net change per species when the reaction fires.
    pub changes: Vec<(usize, i64)>,
}

impl Reaction {
    pub fn new(rate: f64, reactants: &[usize], changes: &[(usize, i64)]) -> Self {
        Self {
            rate,
            reactants: reactants.to_vec(),
            changes: changes.to_vec(),
        }
    }
}

/// Species, reactions and the reaction dependency graph.
#[derive(Debug, Clone)]
pub struct Network {
    pub species: Vec<String>,
    pub reactions: Vec<Reaction>,
    dependents: Vec<Vec<usize>>,
}

impl Network {
    pub fn new(species: Vec<String>, reactions: Vec<Reaction>) -> Self {
        let dependents = reactions
            .iter()
            .map(|fired| {
                reactions
                    .iter()
                    .enumerate()
                    .filter(|(_, other)| {
                        other
                            .reactants
                            .iter()
                            .any(|s| fired.changes.iter().any(|(c, _)| c == s))
                    })
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
        Self {
            species,
            reactions,
            dependents,
        }
    }

    /// Chain of isomerizations `X0 -> X1 -> ... -> Xn-1` where the last species decays,
    /// plus a dimerization `X0 + X0 -> X1`.
    pub fn isomerization_decay(species: usize) -> Self {
        let species = species.max(2);
        let names = (0..species).map(|i| format!("X{i}")).collect();
        let mut reactions: Vec<Reaction> = (0..species - 1)
            .map(|i| Reaction::new(1.0 / (i + 1) as f64, &[i], &[(i, -1), (i + 1, 1)]))
            .collect();
        reactions.push(Reaction::new(0.05, &[species - 1], &[(species - 1, -1)]));
        reactions.push(Reaction::new(1e-4, &[0, 0], &[(0, -2), (1, 1)]));
        Self::new(names, reactions)
    }

    /// Mass-action propensity of reaction `r` in `state`.
    pub fn propensity(&self, r: usize, state: &[i64]) -> f64 {
        let reaction = &self.reactions[r];
        let mut a = reaction.rate;
        let mut seen: Vec<usize> = Vec::with_capacity(reaction.reactants.len());
        for &s in &reaction.reactants {
            let already = seen.iter().filter(|&&x| x == s).count() as i64;
            a *= (state[s] - already).max(0) as f64;
            seen.push(s);
        }
        a
    }

    pub fn propensities(&self, state: &[i64]) -> Vec<f64> {
        (0..self.reactions.len())
            .map(|r| self.propensity(r, state))
            .collect()
    }

    pub fn fire(&self, r: usize, state: &mut [i64]) {
        for &(s, delta) in &self.reactions[r].changes {
            state[s] += delta;
        }
    }

    /// Reactions whose propensity may change when `r` fires, including `r` itself if it
    /// consumes anything.
    pub fn dependents(&self, r: usize) -> &[usize] {
        &self.dependents[r]
    }
}

/// Exponential deviate with the given rate.
pub fn exponential<R: RngExt>(rng: &mut R, rate: f64) -> f64 {
    -(1.0 - rng.random::<f64>()).ln() / rate
}

/// Sampler kind named by the first command-line argument, or `default` if absent.
pub fn kind_from_args(default: SamplerKind) -> anyhow::Result<SamplerKind> {
    match std::env::args().nth(1) {
        Some(name) => name
            .parse()
            .with_context(|| format!("choose one of: {}", kind_names())),
        None => Ok(default),
    }
}

pub fn kind_names() -> String {
    SamplerKind::ALL
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_state(network: &Network, state: &[i64]) {
    for (name, count) in network.species.iter().zip(state) {
        println!("  {name:>4}: {count}");
    }
}
