//! Repeated encode/decode loop for profilers and flamegraphs.
//!
//! Usage: `codec_profile [codec|all] [log level]`

use textcodecs::{analyze, AnyCodec, CodecKind, SymbolTable};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const ROUNDS: usize = 200;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let kinds = match args.next().as_deref() {
        None | Some("all") => CodecKind::ALL.to_vec(),
        Some(name) => vec![name.parse::<CodecKind>()?],
    };
    let level = match args.next().unwrap_or_default().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let table = SymbolTable::new(
        "etaoinshr\u{7f}",
        &[0.18, 0.14, 0.12, 0.11, 0.1, 0.1, 0.09, 0.08, 0.07, 0.01],
    )?;
    let text: Vec<u8> = (0..10_000usize)
        .map(|i| table.symbols()[(i * i + i / 7) % (table.len() - 1)])
        .collect();

    for kind in kinds {
        let codec = AnyCodec::with_sentinel(kind, &table, 0x7f);
        let report = analyze(&codec, &table, &text)?;
        for _ in 0..ROUNDS {
            let encoded = codec.encode(&text)?;
            codec.decode_encoded(&encoded)?;
        }
        info!(
            codec = %kind,
            bits_per_symbol = report.bits_per_symbol,
            entropy = report.entropy,
            round_trip = report.round_trip,
            rounds = ROUNDS,
            "profiled"
        );
    }
    Ok(())
}
