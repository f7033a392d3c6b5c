// Linux-specific helpers: /proc/cpuinfo identity fields.

/// First value for `field` in /proc/cpuinfo-formatted text ("field\t: value").
pub(super) fn cpuinfo_field<'a>(content: &'a str, field: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim() != field {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    })
}

fn read_cpuinfo() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo").ok()
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// "model name" from /proc/cpuinfo. Prefer over sysinfo when it returns "cpu0" etc.
pub(super) fn read_cpu_model_linux() -> Option<String> {
    let content = read_cpuinfo()?;
    cpuinfo_field(&content, "model name")
        .filter(|s| *s != "cpu0")
        .map(str::to_string)
}

/// Core names for common (vendor, family, model) triples; `model` as printed by /proc/cpuinfo.
const MICROARCHITECTURES: &[(&str, u32, &[u32], &str)] = &[
    ("GenuineIntel", 6, &[42, 45], "Sandy Bridge"),
    ("GenuineIntel", 6, &[58, 62], "Ivy Bridge"),
    ("GenuineIntel", 6, &[60, 63, 69, 70], "Haswell"),
    ("GenuineIntel", 6, &[61, 71, 79, 86], "Broadwell"),
    ("GenuineIntel", 6, &[78, 85, 94], "Skylake"),
    ("GenuineIntel", 6, &[142, 158], "Kaby Lake"),
    ("GenuineIntel", 6, &[165, 166], "Comet Lake"),
    ("GenuineIntel", 6, &[106, 108, 126], "Ice Lake"),
    ("GenuineIntel", 6, &[140, 141], "Tiger Lake"),
    ("GenuineIntel", 6, &[151, 154], "Alder Lake"),
    ("GenuineIntel", 6, &[183, 186, 191], "Raptor Lake"),
    ("GenuineIntel", 6, &[143], "Sapphire Rapids"),
    ("AuthenticAMD", 23, &[1, 17, 32], "Zen"),
    ("AuthenticAMD", 23, &[8, 24], "Zen+"),
    ("AuthenticAMD", 23, &[49, 96, 104, 113], "Zen 2"),
    ("AuthenticAMD", 25, &[1, 33, 80], "Zen 3"),
    ("AuthenticAMD", 25, &[17, 97, 116], "Zen 4"),
    ("AuthenticAMD", 26, &[2, 36, 68], "Zen 5"),
];

fn microarchitecture_name(vendor: &str, family: u32, model: u32) -> Option<&'static str> {
    MICROARCHITECTURES
        .iter()
        .find(|(v, f, models, _)| *v == vendor && *f == family && models.contains(&model))
        .map(|(_, _, _, name)| *name)
}

/// Core name such as "Skylake" when the family/model pair is known; otherwise the
/// vendor / family / model triple, e.g. "GenuineIntel family 6 model 1".
pub(super) fn microarchitecture_label(content: &str) -> Option<String> {
    let vendor = cpuinfo_field(content, "vendor_id")?;
    let (Some(family), Some(model)) = (
        cpuinfo_field(content, "cpu family"),
        cpuinfo_field(content, "model"),
    ) else {
        return Some(vendor.to_string());
    };
    if let (Ok(f), Ok(m)) = (family.parse::<u32>(), model.parse::<u32>())
        && let Some(name) = microarchitecture_name(vendor, f, m)
    {
        return Some(name.to_string());
    }
    Some(format!("{} family {} model {}", vendor, family, model))
}

pub(super) fn read_microarchitecture_linux() -> Option<String> {
    microarchitecture_label(&read_cpuinfo()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPUINFO: &str = "processor\t: 0\n\
vendor_id\t: GenuineIntel\n\
cpu family\t: 6\n\
model\t\t: 158\n\
model name\t: Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz\n\
\n\
processor\t: 1\n\
vendor_id\t: GenuineIntel\n";

    #[test]
    fn cpuinfo_field_matches_whole_name() {
        assert_eq!(cpuinfo_field(CPUINFO, "model"), Some("158"));
        assert_eq!(
            cpuinfo_field(CPUINFO, "model name"),
            Some("Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz")
        );
        assert_eq!(cpuinfo_field(CPUINFO, "flags"), None);
    }

    #[test]
    fn microarchitecture_label_names_known_cores() {
        assert_eq!(microarchitecture_label(CPUINFO).as_deref(), Some("Kaby Lake"));
        let zen2 = "vendor_id : AuthenticAMD\ncpu family : 23\nmodel : 113\n";
        assert_eq!(microarchitecture_label(zen2).as_deref(), Some("Zen 2"));
    }

    #[test]
    fn microarchitecture_label_falls_back_to_triple() {
        let unlisted = "vendor_id : GenuineIntel\ncpu family : 6\nmodel : 1\n";
        assert_eq!(
            microarchitecture_label(unlisted).as_deref(),
            Some("GenuineIntel family 6 model 1")
        );
        let amd_as_intel = "vendor_id : AuthenticAMD\ncpu family : 6\nmodel : 158\n";
        assert_eq!(
            microarchitecture_label(amd_as_intel).as_deref(),
            Some("AuthenticAMD family 6 model 158")
        );
    }

    #[test]
    fn microarchitecture_label_without_family_is_vendor_only() {
        assert_eq!(
            microarchitecture_label("vendor_id : AuthenticAMD\n").as_deref(),
            Some("AuthenticAMD")
        );
        assert_eq!(microarchitecture_label("processor : 0\n"), None);
    }
}
