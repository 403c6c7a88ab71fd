use std::time::Duration;

use super::CommandResult;
use crate::formatters::format_document;
use crate::worker::{CardCommand, CardEvent, CardWorker};

pub fn cmd_watch(index: usize, interval_ms: u64, once: bool) -> CommandResult {
    println!("Watching reader {} (every {} ms)\n", index, interval_ms);

    let (events, commands) = CardWorker::spawn(index, Duration::from_millis(interval_ms));

    // the worker hangs up only after a send failed or Stop arrived
    for event in events.iter() {
        match event {
            CardEvent::ReaderAvailable => println!("Reader available"),
            CardEvent::ReaderUnavailable { error } => {
                eprintln!("Reader unavailable: {}", error)
            }
            CardEvent::CardInserted { reader, atr } => {
                println!("Card inserted in {}", reader);
                println!("ATR: {}\n", atr);
            }
            CardEvent::DocumentRead(document) => {
                println!("=== {} ===\n", document.kind());
                println!("{}", format_document(&document));
                if once {
                    let _ = commands.send(CardCommand::Stop);
                    return Ok(());
                }
            }
            CardEvent::ReadFailed { message } => {
                if once {
                    let _ = commands.send(CardCommand::Stop);
                    return Err(format!("Failed to read card: {}", message));
                }
                eprintln!("Failed to read card: {}", message);
            }
            CardEvent::CardRemoved => println!("Card removed\n"),
        }
    }

    Ok(())
}
