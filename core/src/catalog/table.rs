use crate::types::{Category, OsType, RiskLevel};

/// One vetted template row.
pub(crate) struct CatalogEntry {
    pub command: &'static str,
    pub purpose: &'static str,
    pub hint: &'static str,
    pub timeout_secs: u32,
}

const fn entry(
    command: &'static str,
    purpose: &'static str,
    hint: &'static str,
    timeout_secs: u32,
) -> CatalogEntry {
    CatalogEntry {
        command,
        purpose,
        hint,
        timeout_secs,
    }
}

pub(crate) const CATALOG_RISK: RiskLevel = RiskLevel::Safe;

const LINUX_SYSTEM: &[CatalogEntry] = &[
    entry("uname -a", "Kernel and architecture", "Linux <host> <release> ...", 5),
    entry("hostname", "Host name", "single line host name", 5),
    entry("uptime", "Uptime and load average", "up N days, load average: a, b, c", 5),
];
const LINUX_MEMORY: &[CatalogEntry] = &[
    entry("free -m", "Memory usage in MiB", "Mem: total used free ...", 5),
    entry("cat /proc/meminfo", "Detailed memory counters", "MemTotal: N kB", 5),
    entry("vmstat -s", "Virtual memory statistics", "N K total memory", 5),
];
const LINUX_CPU: &[CatalogEntry] = &[
    entry("lscpu", "CPU model and topology", "Model name: ...", 5),
    entry("cat /proc/loadavg", "Load averages", "a b c running/total pid", 5),
    entry("nproc", "Online CPU count", "single integer", 5),
];
const LINUX_DISK: &[CatalogEntry] = &[
    entry("df -h", "Filesystem usage", "Filesystem Size Used Avail Use% Mounted on", 10),
    entry("lsblk", "Block devices", "NAME MAJ:MIN RM SIZE RO TYPE MOUNTPOINT", 10),
    entry("df -i", "Inode usage", "Filesystem Inodes IUsed IFree IUse% Mounted on", 10),
];
const LINUX_NETWORK: &[CatalogEntry] = &[
    entry("ip addr show", "Interfaces and addresses", "N: iface: ... inet a.b.c.d/nn", 10),
    entry("ss -tuln", "Listening sockets", "Netid State Recv-Q Send-Q Local Address:Port", 10),
    entry("ip route show", "Routing table", "default via a.b.c.d dev iface", 10),
];
const LINUX_PROCESSES: &[CatalogEntry] = &[
    entry("ps aux --sort=-%cpu", "Processes by CPU", "USER PID %CPU %MEM ... COMMAND", 10),
    entry("ps aux --sort=-%mem", "Processes by memory", "USER PID %CPU %MEM ... COMMAND", 10),
    entry("top -b -n 1", "Process snapshot", "top - hh:mm:ss up ...", 15),
];

const WINDOWS_SYSTEM: &[CatalogEntry] = &[
    entry("systeminfo", "OS and hardware summary", "Host Name: ... OS Name: ...", 20),
    entry("hostname", "Host name", "single line host name", 5),
    entry("ver", "OS version", "Microsoft Windows [Version ...]", 5),
];
const WINDOWS_MEMORY: &[CatalogEntry] = &[
    entry(
        "wmic OS get FreePhysicalMemory,TotalVisibleMemorySize /Value",
        "Physical memory in KiB",
        "FreePhysicalMemory=N",
        10,
    ),
    entry(
        "Get-CimInstance Win32_OperatingSystem",
        "Operating system memory counters",
        "FreePhysicalMemory TotalVisibleMemorySize",
        15,
    ),
];
const WINDOWS_CPU: &[CatalogEntry] = &[
    entry(
        "wmic cpu get Name,NumberOfCores,LoadPercentage /Value",
        "CPU model and load",
        "LoadPercentage=N",
        10,
    ),
    entry("Get-CimInstance Win32_Processor", "Processor details", "Name NumberOfCores", 15),
];
const WINDOWS_DISK: &[CatalogEntry] = &[
    entry(
        "wmic logicaldisk get Caption,FreeSpace,Size /Value",
        "Logical disk usage",
        "Caption=C: FreeSpace=N Size=N",
        10,
    ),
    entry("Get-PSDrive -PSProvider FileSystem", "Drive usage", "Name Used Free Root", 15),
];
const WINDOWS_NETWORK: &[CatalogEntry] = &[
    entry("ipconfig /all", "Interfaces and addresses", "IPv4 Address. . . : a.b.c.d", 10),
    entry("netstat -an", "Sockets", "Proto Local Address Foreign Address State", 15),
];
const WINDOWS_PROCESSES: &[CatalogEntry] = &[
    entry("tasklist", "Running processes", "Image Name PID Session Name Mem Usage", 15),
    entry("Get-Process", "Running processes", "Handles NPM(K) PM(K) WS(K) CPU(s) Id ProcessName", 15),
];

const MACOS_SYSTEM: &[CatalogEntry] = &[
    entry("sw_vers", "macOS version", "ProductName: macOS", 5),
    entry("uname -a", "Kernel and architecture", "Darwin <host> <release> ...", 5),
    entry("uptime", "Uptime and load average", "up N days, load averages: a b c", 5),
];
const MACOS_MEMORY: &[CatalogEntry] = &[
    entry("vm_stat", "Virtual memory pages", "Pages free: N.", 5),
    entry("sysctl hw.memsize", "Installed memory in bytes", "hw.memsize: N", 5),
];
const MACOS_CPU: &[CatalogEntry] = &[
    entry("sysctl -n machdep.cpu.brand_string", "CPU model", "Apple M1 ...", 5),
    entry("sysctl hw.ncpu", "CPU count", "hw.ncpu: N", 5),
    entry("top -l 1 -n 0", "CPU usage snapshot", "CPU usage: a% user, b% sys, c% idle", 15),
];
const MACOS_DISK: &[CatalogEntry] = &[
    entry("df -h", "Filesystem usage", "Filesystem Size Used Avail Capacity ... Mounted on", 10),
    entry("diskutil list", "Disks and partitions", "/dev/disk0 (internal)", 10),
];
const MACOS_NETWORK: &[CatalogEntry] = &[
    entry("ifconfig", "Interfaces and addresses", "en0: flags=... inet a.b.c.d", 10),
    entry("netstat -rn", "Routing table", "Destination Gateway Flags Netif", 10),
];
const MACOS_PROCESSES: &[CatalogEntry] = &[
    entry("ps aux", "Running processes", "USER PID %CPU %MEM ... COMMAND", 10),
    entry("top -l 1 -n 10", "Process snapshot", "PID COMMAND %CPU TIME ...", 15),
];

pub(crate) fn entries(category: Category, os: OsType) -> &'static [CatalogEntry] {
    match (os, category) {
        (OsType::Windows, Category::SystemInfo) => WINDOWS_SYSTEM,
        (OsType::Windows, Category::Memory) => WINDOWS_MEMORY,
        (OsType::Windows, Category::Cpu) => WINDOWS_CPU,
        (OsType::Windows, Category::Disk) => WINDOWS_DISK,
        (OsType::Windows, Category::Network) => WINDOWS_NETWORK,
        (OsType::Windows, Category::Processes) => WINDOWS_PROCESSES,
        (OsType::Macos, Category::SystemInfo) => MACOS_SYSTEM,
        (OsType::Macos, Category::Memory) => MACOS_MEMORY,
        (OsType::Macos, Category::Cpu) => MACOS_CPU,
        (OsType::Macos, Category::Disk) => MACOS_DISK,
        (OsType::Macos, Category::Network) => MACOS_NETWORK,
        (OsType::Macos, Category::Processes) => MACOS_PROCESSES,
        // Linux, and the fallback for anything unrecognised.
        (_, Category::SystemInfo) => LINUX_SYSTEM,
        (_, Category::Memory) => LINUX_MEMORY,
        (_, Category::Cpu) => LINUX_CPU,
        (_, Category::Disk) => LINUX_DISK,
        (_, Category::Network) => LINUX_NETWORK,
        (_, Category::Processes) => LINUX_PROCESSES,
    }
}
