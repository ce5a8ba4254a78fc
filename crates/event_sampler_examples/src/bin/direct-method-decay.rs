use event_sampler::prelude::*;
use event_sampler_examples::{exponential, kind_from_args, print_state, Network};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    let kind = kind_from_args(SamplerKind::BinnedRejection)?;
    let network = Network::isomerization_decay(8);
    let mut state = vec![0i64; network.species.len()];
    state[0] = 20_000;
    let end_time = 50.0;

    // Direct method: the next reaction is drawn with probability proportional to its
    // propensity, the waiting time from the total propensity.
    let mut sampler = Sampler::new(kind, &network.propensities(&state))?;
    let mut rng = StdRng::seed_from_u64(2025);
    let mut time = 0.0;
    let mut steps = 0u64;

    while time < end_time {
        let total = sampler.weight_sum();
        if total <= 0.0 {
            break;
        }
        time += exponential(&mut rng, total);
        let r = sampler.draw(&mut rng);
        network.fire(r, &mut state);
        for &j in network.dependents(r) {
            sampler.set_weight(j, network.propensity(j, &state))?;
        }
        steps += 1;
    }

    println!("strategy: {kind}");
    println!("steps: {steps}, time: {time:.3}");
    print_state(&network, &state);

    if let Sampler::BinnedRejection(binned) = &sampler {
        let d = binned.diagnostics();
        println!(
            "binned: efficiency {:.3}, acceptance {:.3}, repairs {}, rebuilds {}",
            d.efficiency,
            d.acceptance_rate.unwrap_or(1.0),
            d.repairs,
            d.rebuilds
        );
    }

    Ok(())
}
