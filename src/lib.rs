pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hid;
pub mod proto;
pub mod session;
pub mod slot;
pub mod up;

pub use error::{Error, Result};
pub use session::{Session, SessionConfig};

use config::{Command, Config, DeviceCommand};

pub fn run(cfg: Config) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    let level = match cfg.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();

    let command = match &cfg.command {
        Command::Challenge { data } => {
            println!("{}", proto::derive_buttons(&data.0));
            return Ok(());
        }
        Command::Slots => {
            for number in (1..=12).chain(slot::RSA_SLOTS).chain(slot::ECC_SLOTS) {
                println!("{number:>3}  {}", slot::slot_name(number)?);
            }
            return Ok(());
        }
        Command::Doctor => return diagnostics::check(&cfg),
        Command::Device(command) => command.clone(),
    };

    let mut backend = hid::HidApiBackend::new()?;
    let mut session = Session::connect(&mut backend, cfg.session_config())
        .map_err(|e| anyhow::anyhow!("Failed to connect: {e}"))?;
    let result = dispatch(&mut session, command);
    session.close();
    result
}

fn dispatch(session: &mut Session, command: DeviceCommand) -> anyhow::Result<()> {
    let mut confirmer = up::StdinConfirmer::new();
    match command {
        DeviceCommand::Labels => {
            for slot in session.get_labels()? {
                println!("{slot}");
            }
        }
        DeviceCommand::KeyLabels => {
            for slot in session.get_key_labels()? {
                println!("{slot}");
            }
        }
        DeviceCommand::SetSlot { slot, field, value } => {
            println!("{}", session.set_slot(slot, field, &value)?);
        }
        DeviceCommand::WipeSlot { slot } => {
            for line in session.wipe_slot(slot)? {
                println!("{line}");
            }
        }
        DeviceCommand::Sign { slot, data } => {
            let signature = session.sign(slot, &data.0, &mut confirmer)?;
            println!("{}", hex::encode(signature));
        }
        DeviceCommand::Decrypt { slot, data } => {
            let plaintext = session.decrypt(slot, &data.0, &mut confirmer)?;
            println!("{}", hex::encode(plaintext));
        }
        DeviceCommand::Pubkey { slot } => {
            let key = session.get_public_key(slot)?;
            tracing::info!(len = key.len(), "public key size");
            println!("{}", hex::encode(key));
        }
        DeviceCommand::SetTime { unix_secs } => {
            let now = match unix_secs {
                Some(t) => t,
                None => std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)?
                    .as_secs(),
            };
            session.set_time(now)?;
        }
        DeviceCommand::SetEccKey { slot, key_type, key } => {
            session.set_ecc_key(slot, key_type.into(), &key.0)?;
        }
        DeviceCommand::SetRsaKey { slot, key_type, key } => {
            let reports = session.set_rsa_key(slot, key_type, &key.0)?;
            tracing::info!(reports, "RSA key sent");
        }
        DeviceCommand::BackupKey => {
            println!("{}", hex::encode(session.generate_backup_key()?));
        }
    }
    Ok(())
}
