use bp2bazel_core::CodegenMetrics;
use bp2bazel_core::convert::Explanation;
use std::fmt::Write;
use std::path::Path;

pub fn format_summary(metrics: &CodegenMetrics, files_written: usize, out: &Path) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "✅ Generated {} targets in {} BUILD files under {}",
        metrics.generated_targets,
        files_written,
        out.display()
    );
    for (rule_class, count) in &metrics.rule_class_counts {
        let _ = writeln!(s, "   • {rule_class}: {count}");
    }
    let _ = writeln!(s, "   📦 Converted modules: {}", metrics.converted_modules.len());
    if metrics.disabled_modules > 0 {
        let _ = writeln!(s, "   ⏸  Disabled modules: {}", metrics.disabled_modules);
    }
    if !metrics.handwritten_collisions.is_empty() {
        let _ = writeln!(
            s,
            "   ✋ Skipped (hand-written): {}",
            metrics.handwritten_collisions.len()
        );
    }
    if !metrics.dropped_modules.is_empty() {
        let _ = writeln!(s, "   ⚠️  Dropped modules: {}", metrics.dropped_modules.len());
        for (name, dropped) in &metrics.dropped_modules {
            let _ = writeln!(s, "      • {name}: {}", dropped.reason);
        }
    }
    s
}

pub fn print_summary(metrics: &CodegenMetrics, files_written: usize, out: &Path) {
    print!("{}", format_summary(metrics, files_written, out));
}

pub fn format_explanation(explanation: &Explanation) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "🔍 {} ({}) in {}",
        explanation.name,
        explanation.module_type,
        if explanation.dir.is_empty() { "//" } else { explanation.dir.as_str() }
    );
    let _ = writeln!(s, "{}", "=".repeat(80));
    let _ = writeln!(s, "Status: {}", explanation.status);

    if !explanation.dependencies.is_empty() {
        let _ = writeln!(s, "\n🔗 Dependencies:");
        for dep in &explanation.dependencies {
            let _ = writeln!(s, "   • {} -> {}", dep.reference, dep.status);
        }
    }

    if let Some(error) = &explanation.conversion_error {
        let _ = writeln!(s, "\n❌ Conversion fails: {error}");
    }

    if !explanation.targets.is_empty() {
        let _ = writeln!(s, "\n🎯 Generated targets:");
        for target in &explanation.targets {
            let _ = writeln!(s, "\n{}", target.render());
        }
    }
    s
}

pub fn print_explanation(explanation: &Explanation) {
    print!("{}", format_explanation(explanation));
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp2bazel_core::metrics::DroppedModule;

    #[test]
    fn test_summary_lists_dropped_modules() {
        let mut metrics = CodegenMetrics::new();
        metrics.generated_targets = 3;
        metrics.rule_class_counts.insert("filegroup".to_string(), 3);
        metrics.dropped_modules.insert(
            "app".to_string(),
            DroppedModule {
                kind: "missing_dependency".to_string(),
                reason: "depends on missing module libz".to_string(),
            },
        );

        let summary = format_summary(&metrics, 2, Path::new("out"));

        assert!(summary.starts_with("✅ Generated 3 targets in 2 BUILD files under out"));
        assert!(summary.contains("• filegroup: 3"));
        assert!(summary.contains("• app: depends on missing module libz"));
    }
}
