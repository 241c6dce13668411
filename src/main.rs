use ton_address::{
    AddressError, AddressFlags, FormatError, decode_address, encode_address, to_bounceable,
    to_non_bounceable, to_raw,
};

const SAMPLE: &str = "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8";

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ton_address=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn report(err: &AddressError) {
    match err {
        // Base64url-level errors
        AddressError::Format(FormatError::Base64(e)) => eprintln!("Base64url error: {e}"),
        AddressError::Format(FormatError::InvalidLength { got, expected }) => {
            eprintln!("Invalid length: got {got} bytes, expected {expected}");
        }
        AddressError::Format(FormatError::UnknownTag(tag)) => {
            eprintln!("Unknown tag byte: 0x{tag:02X}");
        }
        // Raw text errors
        AddressError::Format(e) => eprintln!("Malformed raw address: {e}"),
        AddressError::ChecksumMismatch { stored, computed } => {
            eprintln!("Corrupted address: checksum 0x{stored:04X}, expected 0x{computed:04X}");
        }
    }
}

fn main() {
    init_tracing();

    // Accepts either form; defaults to a sample raw address.
    let input = std::env::args().nth(1).unwrap_or_else(|| SAMPLE.to_string());

    let raw = match to_raw(&input) {
        Ok(raw) => raw,
        Err(e) => {
            report(&e);
            std::process::exit(1);
        }
    };
    println!("Raw Address              : {raw}");

    match (to_bounceable(&input), to_non_bounceable(&input)) {
        (Ok(bounceable), Ok(non_bounceable)) => {
            println!("Bounceable               : {bounceable}");
            println!("Non-bounceable           : {non_bounceable}");
        }
        (Err(e), _) | (_, Err(e)) => {
            report(&e);
            std::process::exit(1);
        }
    }

    let testnet = match encode_address(&raw.to_string(), AddressFlags::new(true, true)) {
        Ok(addr) => addr,
        Err(e) => {
            report(&AddressError::Format(e));
            std::process::exit(1);
        }
    };
    println!("Testnet Bounceable       : {testnet}");

    match decode_address(&testnet) {
        Ok(decoded) => {
            println!("Decoded Workchain        : {}", decoded.raw.workchain);
            println!("Decoded Hash (hex)       : {}", decoded.raw.hash_hex());
            println!("Decoded Flags            : {:?}", decoded.flags);
        }
        Err(e) => report(&e),
    }

    // A flipped character must not decode silently.
    let mut corrupted = testnet.into_bytes();
    corrupted[10] = if corrupted[10] == b'A' { b'B' } else { b'A' };
    let corrupted = String::from_utf8_lossy(&corrupted);
    if let Err(e) = decode_address(&corrupted) {
        println!("Corrupted Input          : rejected ({e})");
    }
}
