//! Interactive configurator for LM048 Bluetooth to serial adapters.
//!
//! Thin shell over `lm048-core`: lists serial ports, opens a session on
//! the chosen one, and dispatches menu choices to the typed setting
//! operations. All protocol work lives in the core crate.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::warn;

use lm048_core::protocol::{
    BaudRate, FlowControl, Parity, SerialTransport, Session, StopBits,
};

mod ports;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!();
    println!("Configure LM048 Bluetooth to Serial Adapters");
    println!();
    println!("List of Serial Ports");
    println!("--------------------");

    let ports = ports::list_ports();
    for (idx, port) in ports.iter().enumerate() {
        match &port.product {
            Some(product) => println!("{idx} >  {} ({product})", port.name),
            None => println!("{idx} >  {}", port.name),
        }
    }
    println!("q >  Quit");

    let port_name = loop {
        let choice = prompt("Which port do you want to configure? > ")?;
        if choice.eq_ignore_ascii_case("q") {
            return Ok(());
        }
        if let Ok(num) = choice.parse::<usize>() {
            if let Some(port) = ports.get(num) {
                break port.name.clone();
            }
        }
    };

    let mut session =
        Session::open(&port_name).with_context(|| format!("connecting to {port_name}"))?;

    let outcome = configure(&mut session);

    // Release the port whatever happened above
    if let Err(e) = session.shutdown() {
        warn!(error = %e, "failed to close serial port");
    }

    outcome
}

fn configure(session: &mut Session<SerialTransport>) -> Result<()> {
    println!("Connected to device - {}", session.device_name()?);
    show_settings(session, "Serial settings")?;

    let mut setting_changed = false;
    loop {
        println!("Choose setting");
        println!("0 >  Baud rate");
        println!("1 >  Parity");
        println!("2 >  Stop bits");
        println!("3 >  Flow control");
        println!("q >  Quit");

        let choice = prompt(">")?.to_lowercase();
        match choice.as_str() {
            "q" => break,
            "0" => {
                let input = prompt("Enter new baud rate >")?;
                let Ok(bps) = input.parse::<u32>() else {
                    println!("Invalid baud rate");
                    continue;
                };
                match BaudRate::from_bps(bps) {
                    Ok(rate) => {
                        session.write_setting(rate)?;
                        setting_changed = true;
                    }
                    Err(e) => println!("{e}"),
                }
            }
            "1" => {
                let input = prompt("Enter parity setting (n=None, o=Odd, e=Even) >")?.to_lowercase();
                let parity = match input.as_str() {
                    "n" => Parity::None,
                    "o" => Parity::Odd,
                    "e" => Parity::Even,
                    _ => continue,
                };
                session.write_setting(parity)?;
                setting_changed = true;
            }
            "2" => {
                let input = prompt("Enter stop bits (1 or 2) >")?;
                let stop_bits = match input.as_str() {
                    "1" => StopBits::One,
                    "2" => StopBits::Two,
                    _ => continue,
                };
                session.write_setting(stop_bits)?;
                setting_changed = true;
            }
            "3" => {
                let input = prompt("Enter flow control mode (0=Off, 1=On) >")?;
                let flow = match input.as_str() {
                    "0" => FlowControl::Disabled,
                    "1" => FlowControl::Enabled,
                    _ => continue,
                };
                session.write_setting(flow)?;
                setting_changed = true;
            }
            _ => {}
        }
    }

    // Re-read rather than trust the acknowledgements; a write the module
    // ignored shows up here as the old value
    if setting_changed {
        show_settings(session, "New serial settings")?;
    }

    Ok(())
}

fn show_settings(session: &mut Session<SerialTransport>, label: &str) -> Result<()> {
    let baud: BaudRate = session.read_setting()?;
    let parity: Parity = session.read_setting()?;
    let stop_bits: StopBits = session.read_setting()?;
    let flow: FlowControl = session.read_setting()?;

    println!(
        "{label} Baud: {} Parity: {parity} Stop bits: {stop_bits} Flow control: {flow}",
        format_baud(baud.bps())
    );
    Ok(())
}

/// Render a baud rate the way the module's datasheet quotes them
fn format_baud(bps: u32) -> String {
    if bps > 115_200 {
        format!("{}Kbps", bps as f64 / 1000.0)
    } else {
        format!("{bps}bps")
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
