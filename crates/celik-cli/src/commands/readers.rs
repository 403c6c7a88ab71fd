use celik_card::CardReader;

use super::CommandResult;

pub fn cmd_readers() -> CommandResult {
    let reader = CardReader::new()
        .map_err(|err| format!("Failed to establish PC/SC context: {}", err))?;
    let readers = reader
        .list_readers()
        .map_err(|err| format!("Failed to list readers: {}", err))?;

    if readers.is_empty() {
        println!("No readers found");
        return Ok(());
    }

    for (index, name) in readers.iter().enumerate() {
        println!("{}: {}", index, name);
    }
    Ok(())
}

pub fn cmd_atr(index: usize) -> CommandResult {
    let reader = CardReader::new()
        .map_err(|err| format!("Failed to establish PC/SC context: {}", err))?;
    let session = reader
        .connect(index)
        .map_err(|err| format!("Failed to connect to card: {}", err))?;

    println!("Reader: {}", session.reader);
    println!("ATR: {}", session.atr);

    let candidates = session.atr.candidates();
    if candidates.is_empty() {
        println!("Family: unknown");
    } else {
        let names: Vec<String> = candidates.iter().map(|f| f.to_string()).collect();
        println!("Candidates: {}", names.join(", "));
    }
    Ok(())
}
