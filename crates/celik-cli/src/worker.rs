use celik_card::{CardReader, Document};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Messages sent from the card worker to the printer loop
#[derive(Debug, Clone)]
pub enum CardEvent {
    /// PC/SC context was established
    ReaderAvailable,
    /// PC/SC context could not be established or was lost
    ReaderUnavailable { error: String },
    /// A card was inserted and connected
    CardInserted { reader: String, atr: String },
    /// The inserted card was read successfully
    DocumentRead(Box<Document>),
    /// The inserted card could not be read
    ReadFailed { message: String },
    /// The card was taken out of the reader
    CardRemoved,
}

/// Commands sent to the card worker
#[derive(Debug)]
pub enum CardCommand {
    /// Stop the worker thread
    Stop,
}

/// Background worker polling one reader
pub struct CardWorker {
    reader_index: usize,
    interval: Duration,
    event_tx: Sender<CardEvent>,
    command_rx: Receiver<CardCommand>,
}

impl CardWorker {
    /// Spawn a worker polling the reader at `reader_index` every `interval`
    pub fn spawn(
        reader_index: usize,
        interval: Duration,
    ) -> (Receiver<CardEvent>, Sender<CardCommand>) {
        let (event_tx, event_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();

        thread::spawn(move || {
            let worker = CardWorker {
                reader_index,
                interval,
                event_tx,
                command_rx,
            };
            worker.run();
        });

        (event_rx, command_tx)
    }

    fn run(self) {
        info!(reader = self.reader_index, "Card worker thread started");

        let mut reader: Option<CardReader> = None;
        let mut reader_reported = false;
        let mut card_present = false;

        loop {
            if let Ok(CardCommand::Stop) = self.command_rx.try_recv() {
                info!("Card worker stopping");
                break;
            }

            if reader.is_none() {
                match CardReader::new() {
                    Ok(r) => {
                        info!("PC/SC context established");
                        reader = Some(r);
                        reader_reported = false;
                        if self.event_tx.send(CardEvent::ReaderAvailable).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "PC/SC context unavailable");
                        // report once per outage
                        if !reader_reported {
                            reader_reported = true;
                            let _ = self.event_tx.send(CardEvent::ReaderUnavailable {
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }

            if let Some(ref r) = reader {
                match r.connect(self.reader_index) {
                    Ok(mut session) => {
                        if !card_present {
                            info!(reader = %session.reader, atr = %session.atr, "Card inserted");
                            card_present = true;
                            let _ = self.event_tx.send(CardEvent::CardInserted {
                                reader: session.reader.clone(),
                                atr: session.atr.to_string(),
                            });

                            let event = match session.read_document() {
                                Ok(document) => CardEvent::DocumentRead(Box::new(document)),
                                Err(e) => {
                                    warn!(error = %e, "Failed to read card");
                                    CardEvent::ReadFailed {
                                        message: e.to_string(),
                                    }
                                }
                            };
                            if self.event_tx.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) if e.is_absent() => {
                        if card_present {
                            info!("Card removed");
                            card_present = false;
                            let _ = self.event_tx.send(CardEvent::CardRemoved);
                        }
                    }
                    Err(e) => {
                        // rebuild the context on the next poll
                        warn!(error = %e, "Reader failed");
                        reader = None;
                        card_present = false;
                        let _ = self.event_tx.send(CardEvent::ReaderUnavailable {
                            error: e.to_string(),
                        });
                        reader_reported = true;
                    }
                }
            }

            thread::sleep(self.interval);
        }

        info!("Card worker thread stopped");
    }
}
