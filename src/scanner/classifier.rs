use crate::models::Ecosystem;

/// 所有会被识别为依赖目录的目录名（区分大小写，精确匹配）
pub const TARGET_DIRECTORIES: &[&str] = &[
    "node_modules",       // Node.js 依赖
    "node_modules_cache", // Node.js 缓存
    "vendor",             // Go / PHP vendor
    ".venv",              // Python 虚拟环境
    "venv",               // Python 虚拟环境
    "__pycache__",        // Python 字节码缓存
    "target",             // Rust 构建产物
];

/// 目录名是否为依赖目录
pub fn is_target(name: &str) -> bool {
    classify_type(name) != Ecosystem::Unknown
}

/// 根据目录名判断生态类型
pub fn classify_type(name: &str) -> Ecosystem {
    match name {
        "node_modules" | "node_modules_cache" => Ecosystem::NodeJs,
        "vendor" => Ecosystem::GoPhp,
        ".venv" | "venv" | "__pycache__" => Ecosystem::Python,
        "target" => Ecosystem::Rust,
        _ => Ecosystem::Unknown,
    }
}
