// ============================================================================
// Weft - 程序入口
// ============================================================================
//
// 文件: src/main.rs
// 职责: 命令行程序入口
// 边界:
//   - ✅ 启动异步运行时
//   - ✅ 错误输出与退出码
//   - ❌ 不应包含命令实现
//
// ============================================================================

use weft::utils::logger::Logger;

#[tokio::main]
async fn main() {
    if let Err(e) = weft::cli::run_cli().await {
        Logger::error(format!("{:#}", e));
        std::process::exit(1);
    }
}
