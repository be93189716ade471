use crate::config::loader::{RunConfig, load_config_and_compile};
use crate::log_info;
use crate::logger::Logger;
use crate::worker::worker_loop;

use std::{
    error::Error,
    fs::File,
    io::{self, BufWriter, Write},
    sync::{Arc, atomic::AtomicU64, mpsc},
    thread,
    time::Instant,
};

pub struct App {
    pub config: Arc<RunConfig>,
    pub logger: Logger,
}

impl App {
    pub fn new(config_path: &str) -> Result<Self, Box<dyn Error>> {
        let config = load_config_and_compile(config_path)?;
        let logger = Logger::new(config.quiet);
        Ok(App {
            config: Arc::new(config),
            logger,
        })
    }

    pub fn run(&self) -> Result<(), Box<dyn Error>> {
        let start = Instant::now();

        let mut writer: Box<dyn Write> = match &self.config.output_file {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::stdout()),
        };

        if self.config.header {
            let names: Vec<&str> = self.config.fields.iter().map(|f| f.name.as_str()).collect();
            writeln!(writer, "{}", names.join(&self.config.delimiter))?;
        }

        log_info!(
            self.logger,
            "Generating {} records with {} worker(s), {} field(s).",
            self.config.count,
            self.config.threads,
            self.config.fields.len()
        );

        let (tx, rx) = mpsc::channel();
        let next_index = Arc::new(AtomicU64::new(0));
        let mut handles = Vec::with_capacity(self.config.threads);
        for worker_id in 0..self.config.threads {
            let config = Arc::clone(&self.config);
            let next_index = Arc::clone(&next_index);
            let tx = tx.clone();
            let logger = self.logger.clone();
            handles.push(thread::spawn(move || {
                worker_loop(worker_id, config, next_index, tx, logger)
            }));
        }
        // Writer loop below ends once every worker has dropped its sender.
        drop(tx);

        let mut written = 0u64;
        for record in rx {
            writeln!(writer, "{}", record.values.join(&self.config.delimiter))?;
            written += 1;
        }

        for handle in handles {
            if handle.join().is_err() {
                self.logger.error("A generator worker panicked.");
            }
        }
        writer.flush()?;

        log_info!(
            self.logger,
            "Generated {} records in {:.2?}.",
            written,
            start.elapsed()
        );
        Ok(())
    }
}
