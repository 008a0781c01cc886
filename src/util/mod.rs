use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;

pub mod datetime;
pub mod http;
pub mod map;
pub mod text;

/// 併發上限：CPU 核心數的倍數，至少 4
pub fn concurrent_limit(multiplier: usize) -> usize {
    (num_cpus::get() * multiplier).max(4)
}

/// 將原始回應內容存到指定資料夾，回傳完整檔案路徑
///
/// 資料夾不存在會先建立。
pub fn save_raw(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let mut path = PathBuf::from(dir);
    path.push(file_name);
    fs::write(&path, content)?;

    Ok(path)
}

/// 附加一行文字到指定檔案，檔案不存在會先建立並寫入標題列
pub fn append_line(dir: &Path, file_name: &str, header: &str, line: &str) -> Result<()> {
    use std::io::Write;

    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let mut path = PathBuf::from(dir);
    path.push(file_name);

    let new_file = !path.exists();
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;

    if new_file {
        writeln!(file, "{}", header)?;
    }

    writeln!(file, "{}", line)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_raw_and_append_line() {
        let dir = std::env::temp_dir().join("stock_pipeline_util_test");
        let path = save_raw(&dir, "raw.csv", "a,b,c").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b,c");

        append_line(&dir, "series.csv", "date,close", "2025-05-08,1000").unwrap();
        append_line(&dir, "series.csv", "date,close", "2025-05-09,1010").unwrap();
        let content = fs::read_to_string(dir.join("series.csv")).unwrap();
        assert_eq!(content, "date,close\n2025-05-08,1000\n2025-05-09,1010\n");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_concurrent_limit() {
        assert!(concurrent_limit(1) >= 4);
    }
}
