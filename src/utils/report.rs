use std::io::{self, Write};

use crate::models::{CleanResult, ScanResult};
use crate::scanner::CacheStats;
use crate::utils::{size_format, time_format};

const RULE_WIDTH: usize = 80;

/// 以表格形式输出扫描结果（按大小降序）
pub fn write_scan_table<W: Write>(out: &mut W, result: &ScanResult) -> io::Result<()> {
    let rule = "─".repeat(RULE_WIDTH);

    writeln!(out, "扫描结果: {}", result.root_path.display())?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "{:>10}  {:<12}  {:<8}  路径", "大小", "最后访问", "类型")?;
    writeln!(out, "{}", rule)?;

    for folder in result.sorted_by_size() {
        let mut line = format!(
            "{:>10}  {:<12}  {:<8}  {}",
            size_format::format_size(folder.size),
            time_format::format_relative_time(folder.access_time),
            folder.ecosystem.label(),
            folder.path.display()
        );
        if folder.is_partial() {
            line.push_str(" (部分)");
        }
        writeln!(out, "{}", line)?;
    }

    writeln!(out, "{}", rule)?;
    write_scan_summary(out, result)
}

/// 输出扫描汇总
pub fn write_scan_summary<W: Write>(out: &mut W, result: &ScanResult) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "汇总:")?;
    writeln!(out, "  目录数量: {}", result.total_count)?;
    writeln!(out, "  总大小:   {}", size_format::format_size(result.total_size))?;
    writeln!(out, "  耗时:     {}", time_format::format_duration(result.duration))?;

    let mut by_ecosystem: Vec<_> = result.size_by_ecosystem().into_iter().collect();
    by_ecosystem.sort_by(|a, b| b.1 .1.cmp(&a.1 .1));
    for (label, (count, size)) in by_ecosystem {
        writeln!(
            out,
            "  {:<8} {} 个, {} ({:.1}%)",
            label,
            count,
            size_format::format_size(size),
            size_format::percentage(size, result.total_size)
        )?;
    }

    if let Some(rate) = result.cache_hit_rate() {
        if result.cache_hits > 0 {
            writeln!(out, "  缓存命中: {} ({:.1}%)", result.cache_hits, rate)?;
        }
    }
    if result.error_count > 0 {
        writeln!(out, "  错误:     {} 个路径无法访问", result.error_count)?;
    }
    if result.cancelled {
        writeln!(out, "  扫描已取消，结果不完整")?;
    }

    Ok(())
}

/// 以 JSON 输出扫描结果
pub fn write_scan_json<W: Write>(out: &mut W, result: &ScanResult) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, result)?;
    writeln!(out).map_err(serde_json::Error::io)
}

/// 输出清理结果
pub fn write_clean_report<W: Write>(out: &mut W, result: &CleanResult) -> io::Result<()> {
    if result.dry_run {
        writeln!(out, "演练模式，没有删除任何文件")?;
    }

    let verb = if result.dry_run { "将删除" } else { "已删除" };
    for path in &result.deleted {
        writeln!(out, "  ✓ {} {}", verb, path.display())?;
    }
    for failed in &result.failed {
        writeln!(out, "  ✗ {}: {}", failed.path.display(), failed.reason)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} {} 个目录，释放 {}",
        verb,
        result.deleted.len(),
        size_format::format_size(result.space_reclaimed)
    )?;
    if !result.failed.is_empty() {
        writeln!(out, "失败 {} 个", result.failed.len())?;
    }

    Ok(())
}

/// 输出缓存统计
pub fn write_cache_stats<W: Write>(
    out: &mut W,
    cache_path: &std::path::Path,
    stats: &CacheStats,
) -> io::Result<()> {
    writeln!(out, "缓存文件: {}", cache_path.display())?;
    writeln!(out, "  条目数量: {}", stats.total_entries)?;
    writeln!(out, "  记录大小: {}", size_format::format_size(stats.total_cached_size))?;
    writeln!(out, "  文件大小: {}", size_format::format_size(stats.cache_file_size))?;
    writeln!(out, "  更新时间: {}", time_format::format_time(stats.last_updated))?;
    Ok(())
}
