use event_sampler::prelude::*;
use event_sampler_examples::{exponential, print_state, Network};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    let network = Network::isomerization_decay(8);
    let mut state = vec![0i64; network.species.len()];
    state[0] = 20_000;
    let end_time = 50.0;

    let mut rng = StdRng::seed_from_u64(2025);
    let mut propensities = network.propensities(&state);
    let mut queue = HashingQueue::with_config(
        propensities.len(),
        HashingConfig::default().with_target_load(2.0),
    )?;

    // Next-reaction method: every reaction carries its own firing time. Reactions that
    // cannot fire get an infinite time and stay out of the way.
    let schedule = |rng: &mut StdRng, now: f64, a: f64| {
        if a > 0.0 {
            now + exponential(rng, a)
        } else {
            f64::INFINITY
        }
    };
    for (r, &a) in propensities.iter().enumerate() {
        queue.push(r, schedule(&mut rng, 0.0, a));
    }

    let mut time = 0.0;
    let mut steps = 0u64;
    loop {
        if propensities.iter().sum::<f64>() <= 0.0 {
            break;
        }
        let r = queue.top(&propensities);
        let next = queue.get(r);
        if next > end_time {
            break;
        }
        time = next;
        network.fire(r, &mut state);

        let a = network.propensity(r, &state);
        propensities[r] = a;
        queue.push_top(schedule(&mut rng, time, a));

        for &j in network.dependents(r) {
            if j == r {
                continue;
            }
            let old = propensities[j];
            let new = network.propensity(j, &state);
            propensities[j] = new;
            // Rescale the remaining waiting time instead of drawing a new one.
            let key = if old > 0.0 && new > 0.0 {
                time + (old / new) * (queue.get(j) - time)
            } else {
                schedule(&mut rng, time, new)
            };
            queue.set(j, key);
        }
        steps += 1;
    }

    println!("next-reaction method with hashing queue");
    println!(
        "steps: {steps}, time: {time:.3}, table rebuilds: {}",
        queue.rebuilds()
    );
    print_state(&network, &state);

    Ok(())
}
