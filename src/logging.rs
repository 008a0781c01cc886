use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
};

use chrono::{DateTime, Local, NaiveDate};
use crossbeam_channel::{unbounded, Sender};
use once_cell::sync::Lazy;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

/// 非同步檔案日誌
///
/// 呼叫端只把訊息送進 channel，寫入檔案的操作使用另一個線程處理，
/// 避免磁碟 I/O 卡住抓取流程。日誌檔依日期命名放在 log/ 底下。
pub struct Logger {
    writer: Sender<LogMessage>,
}

impl Logger {
    pub(crate) fn new(log_name: &str) -> Self {
        let name = log_name.to_string();
        let (tx, rx) = unbounded::<LogMessage>();

        thread::spawn(move || {
            let mut current_date = Local::now().date_naive();
            let mut writer = Self::open_writer(&name, current_date);
            let mut line = String::with_capacity(4096);

            while let Ok(received) = rx.recv() {
                use std::fmt::Write as _;

                // 跨日換檔，長駐的排程不會一直寫到啟動當天的檔案
                let msg_date = received.created_at.date_naive();
                if msg_date != current_date {
                    if let Some(w) = writer.as_mut() {
                        if !line.is_empty() && w.write_all(line.as_bytes()).is_ok() {
                            line.clear();
                        }
                        let _ = w.flush();
                    }
                    current_date = msg_date;
                    writer = Self::open_writer(&name, current_date);
                }

                if writeln!(
                    &mut line,
                    "{} {} {}",
                    received.created_at.format("%F %X%.6f"),
                    received.level,
                    received.msg
                )
                .is_err()
                {
                    continue;
                }

                // channel 清空或緩衝夠大時才落盤
                if rx.is_empty() || line.len() >= 4096 {
                    match writer.as_mut() {
                        Some(w) => {
                            if w.write_all(line.as_bytes()).is_err() || w.flush().is_err() {
                                info_console(line.clone());
                            }
                        }
                        None => info_console(line.clone()),
                    }

                    line.clear();
                }
            }
        });

        Logger { writer: tx }
    }

    pub(crate) fn info(&self, log: String) {
        self.send(log::Level::Info, log);
    }

    pub(crate) fn warn(&self, log: String) {
        self.send(log::Level::Warn, log);
    }

    pub(crate) fn error(&self, log: String) {
        self.send(log::Level::Error, log);
    }

    pub(crate) fn debug(&self, log: String) {
        self.send(log::Level::Debug, log);
    }

    fn send(&self, level: log::Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            error_console(why.to_string());
        }
    }

    fn open_writer(name: &str, date: NaiveDate) -> Option<BufWriter<File>> {
        let log_path = Self::log_file_path(name, date)?;

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok()
            .map(BufWriter::new)
    }

    fn log_file_path(name: &str, date: NaiveDate) -> Option<PathBuf> {
        let path = Path::new("log");

        if !path.exists() {
            fs::create_dir_all(path).ok()?;
        }

        let mut log_path = PathBuf::from(path);
        log_path.push(format!("{}_{}.log", name, date.format("%Y-%m-%d")));

        Some(log_path)
    }
}

pub struct LogMessage {
    pub level: log::Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: log::Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn warn_file_async(log: String) {
    LOGGER.warn(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    println!(
        "{} Error {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_message() {
        let msg = LogMessage::new(log::Level::Info, "測試".to_string());
        assert_eq!(msg.level, log::Level::Info);
        assert_eq!(msg.msg, "測試");
    }

    #[test]
    fn test_log_file_path_follows_date() {
        let d1 = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 5, 9).unwrap();

        let p1 = Logger::log_file_path("default", d1).unwrap();
        let p2 = Logger::log_file_path("default", d2).unwrap();

        assert!(p1.ends_with("default_2025-05-08.log"));
        assert!(p2.ends_with("default_2025-05-09.log"));
        assert_ne!(p1, p2);
    }
}
