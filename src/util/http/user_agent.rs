use rand::Rng;

const CHROME_VERSIONS: [&str; 8] = [
    "126.0.6478.126",
    "125.0.6422.141",
    "124.0.6367.201",
    "123.0.6312.122",
    "122.0.6261.129",
    "121.0.6167.184",
    "120.0.6099.217",
    "119.0.6045.159",
];

const FIREFOX_VERSIONS: [&str; 8] = [
    "128.0", "127.0", "126.0", "125.0", "124.0", "123.0", "122.0", "121.0",
];

const OS_STRINGS: [&str; 4] = [
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "Windows NT 10.0; WOW64",
];

fn gen_chrome_ua() -> String {
    let mut rng = rand::thread_rng();
    let version = CHROME_VERSIONS[rng.gen_range(0..CHROME_VERSIONS.len())];
    let os = OS_STRINGS[rng.gen_range(0..OS_STRINGS.len())];

    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        os, version
    )
}

fn gen_firefox_ua() -> String {
    let mut rng = rand::thread_rng();
    let version = FIREFOX_VERSIONS[rng.gen_range(0..FIREFOX_VERSIONS.len())];
    let os = OS_STRINGS[rng.gen_range(0..OS_STRINGS.len())];

    format!(
        "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
        os, version, version
    )
}

/// 隨機產生一個常見瀏覽器的 User-Agent，降低被目標網站辨識為爬蟲的機率
pub fn gen_random_ua() -> String {
    if rand::thread_rng().gen_bool(0.5) {
        gen_chrome_ua()
    } else {
        gen_firefox_ua()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_random_ua() {
        for _ in 0..16 {
            let ua = gen_random_ua();
            assert!(ua.starts_with("Mozilla/5.0"));
            assert!(ua.contains("Chrome/") || ua.contains("Firefox/"));
        }
    }
}
