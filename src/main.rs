use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, bail};
use qriskit::error::QrisError;
use qriskit::merchant;
use qriskit::payment::{FeeKind, FeeSpec, PaymentRequest, rebuild};
use qriskit::tlv::ParsedPayload;
use qriskit::validator;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a payload and print the merchant record as JSON
    Inspect {
        /// Raw QR payload string
        payload: String,
    },
    /// Classify a payload and verify its checksum
    Validate {
        /// Raw QR payload string
        payload: String,
    },
    /// Inject a payment amount and print the rebuilt payload
    Pay {
        /// Raw QR payload string
        payload: String,

        /// Payment amount in whole currency units
        #[arg(long)]
        amount: Decimal,

        /// Fee amount (flat units or percentage, per --fee-type)
        #[arg(long, default_value = "0")]
        fee: Decimal,

        /// How the fee applies: flat or percentage
        #[arg(long, default_value = "flat")]
        fee_type: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { payload } => {
            let parsed = decode(&payload)?;
            print_json(&merchant::extract(&parsed))
        }
        Command::Validate { payload } => {
            let classification = validator::classify(&payload).into_diagnostic()?;
            print_json(&classification)
        }
        Command::Pay {
            payload,
            amount,
            fee,
            fee_type,
        } => {
            let kind = match fee_type.as_str() {
                "flat" => FeeKind::Flat,
                "percentage" => FeeKind::Percentage,
                other => bail!("unknown fee type {other:?}, expected flat or percentage"),
            };

            // Refuse payloads that are not QR-payment-shaped before rewriting.
            let classification = validator::classify(&payload).into_diagnostic()?;
            if classification.status == validator::QrStatus::Invalid {
                return Err(QrisError::UnsupportedFormat(
                    "payload is not an EMVCo merchant-presented QR".to_string(),
                ))
                .into_diagnostic();
            }

            let parsed = decode(&payload)?;
            let request = PaymentRequest {
                base_amount: amount,
                fee: FeeSpec { amount: fee, kind },
            };
            let rebuilt = rebuild(&parsed, &request).into_diagnostic()?;
            print_json(&rebuilt)
        }
    }
}

fn decode(payload: &str) -> Result<ParsedPayload> {
    ParsedPayload::decode(payload).into_diagnostic()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
