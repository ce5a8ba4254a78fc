use event_sampler::prelude::*;
use event_sampler_examples::kind_names;
use rand::rngs::StdRng;
use rand::SeedableRng;

const DRAWS: usize = 1_000_000;

fn frequencies(sampler: &mut Sampler, rng: &mut StdRng) -> Vec<f64> {
    let mut counts = vec![0usize; sampler.len()];
    for _ in 0..DRAWS {
        counts[sampler.draw(rng)] += 1;
    }
    counts.iter().map(|&c| c as f64 / DRAWS as f64).collect()
}

fn report(label: &str, weights: &[f64], results: &[(SamplerKind, Vec<f64>)]) {
    let total: f64 = weights.iter().sum();
    println!("{label}");
    print!("{:>22}", "expected");
    for w in weights {
        print!(" {:>7.4}", w / total);
    }
    println!();
    for (kind, freq) in results {
        print!("{:>22}", kind.name());
        for f in freq {
            print!(" {f:>7.4}");
        }
        println!();
    }
    println!();
}

fn main() -> anyhow::Result<()> {
    println!("strategies: {}\n", kind_names());

    let mut weights = vec![1.0, 2.0, 4.0, 8.0, 0.0, 3.0, 0.5, 6.0];
    let mut samplers = SamplerKind::ALL
        .into_iter()
        .map(|kind| Sampler::new(kind, &weights))
        .collect::<Result<Vec<_>>>()?;

    let mut rng = StdRng::seed_from_u64(7);
    let results: Vec<_> = samplers
        .iter_mut()
        .map(|s| (s.kind(), frequencies(s, &mut rng)))
        .collect();
    report("initial weights", &weights, &results);

    let updates = [(3, 0.0), (4, 5.0), (0, 10.0)];
    for s in &mut samplers {
        for &(i, w) in &updates {
            s.set_weight(i, w)?;
        }
    }
    for &(i, w) in &updates {
        weights[i] = w;
    }
    let results: Vec<_> = samplers
        .iter_mut()
        .map(|s| (s.kind(), frequencies(s, &mut rng)))
        .collect();
    report("after updates", &weights, &results);

    Ok(())
}
