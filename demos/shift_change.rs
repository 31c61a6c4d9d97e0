//! An alarm raised at the end of a shift survives the machine being
//! switched off overnight, and is still waiting for the operator after
//! power-up the next morning.
//!
//! Run with: cargo run --example shift_change

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tinyol::{to_fixed_vec, Fixed, Model, State};

fn main() -> tinyol::Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut model = Model::new(2, 0.3)?;

    // Afternoon shift: healthy baseline, then something goes wrong.
    for _ in 0..40 {
        let x = 0.1 + rng.gen_range(-0.003..0.003);
        let y = 0.1 + rng.gen_range(-0.003..0.003);
        model.update(&to_fixed_vec(&[x, y]))?;
    }
    model.update(&to_fixed_vec(&[7.0, 7.0]))?;
    println!("end of shift: state={:?}", model.state());

    // Machine powered down for the night: signals go quiet.
    let (rms, current) = (Fixed::from_f32(0.1), Fixed::from_f32(0.02));
    for _ in 0..12 {
        model.update_activity(rms, current);
    }
    println!(
        "overnight: motor_running={}  state={:?}",
        model.is_motor_running(),
        model.state()
    );

    // Morning: machine spins up. The alarm did not silently resolve.
    for _ in 0..5 {
        model.update_activity(Fixed::from_f32(4.0), Fixed::from_f32(1.2));
    }
    println!(
        "morning: motor_running={}  state={:?}  buffered={}",
        model.is_motor_running(),
        model.state(),
        model.buffer_len()
    );
    assert_eq!(model.state(), State::WaitingLabel);

    // Day-shift operator reviews the buffered anomaly and labels it.
    model.add_cluster("spindle_wear")?;
    println!("labeled; state={:?}  k={}", model.state(), model.k());

    Ok(())
}
