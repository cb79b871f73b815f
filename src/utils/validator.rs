use url::Url;

/// 只接受可以解析且协议为 http/https 的URL
pub fn is_valid_url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// 从URL路径中推断文件名，推断不出时返回 None
pub fn filename_from_url(input: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}
