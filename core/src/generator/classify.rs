use crate::types::Category;

/// One row of the classification table. Single-word keywords match whole
/// words; multi-word keywords match as substrings.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub category: Category,
    pub keywords: &'static [&'static str],
}

/// Evaluated top to bottom; the first matching row wins.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        category: Category::Memory,
        keywords: &[
            "memory", "mem", "ram", "swap", "oom", "meminfo", "out of memory",
        ],
    },
    ClassificationRule {
        category: Category::Cpu,
        keywords: &[
            "cpu", "cpus", "processor", "processors", "core", "cores", "load",
            "utilization", "load average",
        ],
    },
    ClassificationRule {
        category: Category::Disk,
        keywords: &[
            "disk", "disks", "storage", "space", "filesystem", "filesystems",
            "partition", "partitions", "mount", "mounts", "volume", "volumes",
            "inode", "inodes",
        ],
    },
    ClassificationRule {
        category: Category::Network,
        keywords: &[
            "network", "networking", "ip", "interface", "interfaces", "port",
            "ports", "connection", "connections", "dns", "route", "routes",
            "routing", "socket", "sockets", "bandwidth", "listening",
        ],
    },
    ClassificationRule {
        category: Category::Processes,
        keywords: &[
            "process", "processes", "service", "services", "daemon", "daemons",
            "running", "pid", "task", "tasks",
        ],
    },
    ClassificationRule {
        category: Category::SystemInfo,
        keywords: &[
            "system", "os", "hostname", "host", "uptime", "kernel", "version",
            "uname", "info", "information", "boot", "operating system",
        ],
    },
];

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn rule_matches(rule: &ClassificationRule, lower: &str, words: &[String]) -> bool {
    rule.keywords.iter().any(|k| {
        if k.contains(' ') {
            lower.contains(k)
        } else {
            words.iter().any(|w| w == k)
        }
    })
}

/// Category of the first matching rule, or system info.
pub fn classify(description: &str) -> Category {
    matched_categories(description)
        .into_iter()
        .next()
        .unwrap_or(Category::SystemInfo)
}

/// Every category whose rule matches, in table order.
pub fn matched_categories(description: &str) -> Vec<Category> {
    let lower = description.to_lowercase();
    let words = words(description);
    RULES
        .iter()
        .filter(|r| rule_matches(r, &lower, &words))
        .map(|r| r.category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rule_wins() {
        assert_eq!(classify("check memory and disk on this server"), Category::Memory);
        assert_eq!(
            matched_categories("check memory and disk on this server"),
            vec![Category::Memory, Category::Disk]
        );
    }

    #[test]
    fn whole_word_matching() {
        // "program" contains "ram" but is not a memory question.
        assert_eq!(classify("which program is slow"), Category::SystemInfo);
        assert_eq!(classify("Which ports are listening?"), Category::Network);
        assert_eq!(classify("high CPU load"), Category::Cpu);
    }

    #[test]
    fn default_is_system_info() {
        assert_eq!(classify("check uptime"), Category::SystemInfo);
        assert_eq!(classify("hello there"), Category::SystemInfo);
        assert!(matched_categories("hello there").is_empty());
    }
}
