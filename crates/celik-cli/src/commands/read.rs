use celik_card::protocol::files;
use celik_card::{classify, Card, CardError, CardReader, FileTransport, Session};

use super::CommandResult;
use crate::formatters::{format_document, FormatMode};

pub fn cmd_read(index: usize, format_mode: FormatMode) -> CommandResult {
    println!("Celik Card Reader - {} Mode\n", format_mode.description());

    let reader = CardReader::new()
        .map_err(|err| format!("Failed to establish PC/SC context: {}", err))?;
    let mut session = reader.connect(index).map_err(|err| {
        format!(
            "Failed to connect to card: {}\nPlease ensure a card is present on the reader",
            err
        )
    })?;

    println!("Reader: {}", session.reader);
    println!("ATR: {}\n", session.atr);

    match format_mode {
        FormatMode::Human => {
            let document = session
                .read_document()
                .map_err(|err| format!("Failed to read card: {}", err))?;
            println!("=== {} ===\n", document.kind());
            print!("{}", format_document(&document));
        }
        FormatMode::Raw => {
            dump_files(&mut session).map_err(|err| format!("Failed to read card: {}", err))?
        }
    }
    Ok(())
}

/// Print every document file of the card as hex, without decoding it
fn dump_files(session: &mut Session) -> Result<(), CardError> {
    let family = classify(&session.atr, &mut session.card)?;
    println!("Family: {}\n", family);

    let mut card = Card::new(family, &mut session.card);
    card.initialize()?;

    for file in files::for_family(family) {
        let data = card.read_file(file)?;
        println!("File {} ({} bytes):", hex::encode_upper(file), data.len());
        println!("{}\n", hex::encode_upper(&data));
    }

    if let Card::Vehicle(vehicle) = &mut card {
        let tree = vehicle.read_tree()?;
        println!("=== Merged BER tree ===\n");
        print!("{}", tree);
    }
    Ok(())
}
