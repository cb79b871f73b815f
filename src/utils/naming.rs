/// 文件名中不允许出现的字符，统一替换为下划线
const INVALID_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// 文件名长度上限（字符数）
const MAX_FILENAME_LEN: usize = 200;

/// 清洗文件名：替换非法字符并截断到长度上限。
/// 该操作是幂等的：sanitize(sanitize(x)) == sanitize(x)。
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// 根据 MIME 类型查扩展名，未识别的类型统一归入 .unknown
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    if mime_type.contains("mp4") {
        ".mp4"
    } else if mime_type.contains("webm") {
        ".webm"
    } else if mime_type.contains("mp3") {
        ".mp3"
    } else if mime_type.contains("m4a") {
        ".m4a"
    } else {
        ".unknown"
    }
}
