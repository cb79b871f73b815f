use vergen::EmitBuilder;

fn main() {
    // 生成构建时间和git信息，供 --version 展示
    EmitBuilder::builder()
        .all_build()
        .all_git()
        .emit()
        .expect("Failed to emit build information");
}
