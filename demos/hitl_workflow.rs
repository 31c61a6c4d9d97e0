//! The full human-in-the-loop loop: baseline, alarm, label, recognize.
//!
//! Run with: cargo run --example hitl_workflow

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tinyol::{to_fixed_vec, Fixed, Model, State};

fn reading(rng: &mut ChaCha8Rng, base: [f32; 2]) -> Vec<Fixed> {
    to_fixed_vec(&[
        base[0] + rng.gen_range(-0.003..0.003),
        base[1] + rng.gen_range(-0.003..0.003),
    ])
}

fn main() -> tinyol::Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut model = Model::new(2, 0.3)?;

    println!("== Healthy operation ==");
    for _ in 0..50 {
        model.update(&reading(&mut rng, [0.1, 0.1]))?;
    }
    println!(
        "state={:?}  k={}  points={}",
        model.state(),
        model.k(),
        model.total_points()
    );

    println!("\n== Bearing starts to fail ==");
    for _ in 0..5 {
        let outcome = model.update(&reading(&mut rng, [8.0, 8.0]))?;
        println!("fault-like sample -> {outcome:?}  state={:?}", model.state());
    }

    println!("\n== Operator investigates ==");
    model.request_label();
    println!(
        "frozen with {} buffered anomaly samples",
        model.buffer_len()
    );

    let id = model.add_cluster("bearing_fault")?;
    let centroid = model.centroid(id).expect("cluster exists");
    println!(
        "labeled cluster {id} at ({:.2}, {:.2}); back to {:?}",
        centroid[0].to_f32(),
        centroid[1].to_f32(),
        model.state()
    );

    println!("\n== The fault is now a known class ==");
    let p = reading(&mut rng, [8.0, 8.0]);
    println!(
        "predict(fault-like) -> cluster {} ({:?})",
        model.predict(&p)?,
        model.label(model.predict(&p)?).unwrap_or("?")
    );
    assert_eq!(model.state(), State::Normal);

    Ok(())
}
