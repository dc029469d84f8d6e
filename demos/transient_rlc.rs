use std::io;
use std::time::Duration;

use kirchhoff_ode::prelude::*;

fn main() -> Result<()> {
    // V1 drives R1 and L1 into R2, with C1 tied across R2 by an ideal line.
    let topology = CircuitTopology::new(vec![
        Element::voltage_source("V1", 1, 0, 100.0)?,
        Element::resistor("R1", 1, 2, 1.0)?,
        Element::inductor("L1", 2, 3, 1e-3)?,
        Element::resistor("R2", 3, 0, 10.0)?,
        Element::line("X1", 3, 4)?,
        Element::capacitor("C1", 4, 0, 1e-3)?,
    ])?;
    eprintln!("{}", topology.summary());

    let model = StateSpaceModel::from_topology(&topology)?;
    for line in model.equations() {
        eprintln!("{line}");
    }

    let initial = InitialConditions::new().with("I_L1", 0.0).with("U_C1", 0.0);
    let config = SimulationConfig::adaptive(
        "transient_rlc",
        Duration::from_millis(50),
        Duration::from_micros(10),
        1e-9,
        1e-6,
    );
    let waveform = simulate(&model, &initial, &config)?;

    let stdout = io::stdout();
    if let Err(err) = write_transient_state_csv(stdout.lock(), &waveform) {
        eprintln!("failed to write CSV: {err}");
    }
    Ok(())
}
