//! Built-in policy tables, one per crate in the workspace.

use super::{ActionPolicy, EnvOverride, PolicyTable};
use clap::ValueEnum;
use serde::Deserialize;

const TEST_THREADS: &str = "RUST_TEST_THREADS";
const RUSTFLAGS: &str = "RUSTFLAGS";

const NATIVE: &str = "-Ctarget-cpu=native";
/// `swym-htm` only compiles its transactional paths with RTM enabled.
const RTM_NATIVE: &str = "-Ctarget-feature=+rtm -Ctarget-cpu=native";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// The STM library itself: serial tests with allocator debugging and stats.
    #[default]
    #[value(name = "swym")]
    Swym,
    /// Hardware transactional memory bindings (x86 RTM).
    #[value(name = "htm")]
    Htm,
    /// Red-black tree on top of swym, built with nightly.
    #[value(name = "rbtree")]
    Rbtree,
}

impl Preset {
    pub fn name(self) -> &'static str {
        match self {
            Preset::Swym => "swym",
            Preset::Htm => "htm",
            Preset::Rbtree => "rbtree",
        }
    }

    /// Toolchain pinned by the preset, passed to cargo as `+<toolchain>`.
    pub fn toolchain(self) -> Option<&'static str> {
        match self {
            Preset::Swym | Preset::Htm => None,
            Preset::Rbtree => Some("nightly"),
        }
    }

    pub fn table(self) -> PolicyTable {
        match self {
            Preset::Swym => PolicyTable::new()
                .with(
                    "test",
                    ActionPolicy::new()
                        .env(EnvOverride::set(TEST_THREADS, "1"))
                        .args(["--features", "debug-alloc,stats"]),
                )
                .with(
                    "bench",
                    ActionPolicy::new().env(EnvOverride::append(RUSTFLAGS, NATIVE)),
                ),
            Preset::Htm => {
                let rtm = ActionPolicy::new()
                    .env(EnvOverride::append(RUSTFLAGS, RTM_NATIVE))
                    .args(["--features", "rtm"]);
                PolicyTable::new()
                    .with(
                        "test",
                        ActionPolicy::new()
                            .env(EnvOverride::set(TEST_THREADS, "1"))
                            .env(EnvOverride::append(RUSTFLAGS, RTM_NATIVE))
                            .args(["--features", "rtm"]),
                    )
                    .with("doc", rtm.clone())
                    .with("bench", rtm)
            }
            Preset::Rbtree => PolicyTable::new()
                .with(
                    "test",
                    ActionPolicy::new()
                        .env(EnvOverride::set(TEST_THREADS, "1"))
                        .args(["--features", "stats"]),
                )
                .with(
                    "bench",
                    ActionPolicy::new().env(EnvOverride::append(RUSTFLAGS, NATIVE)),
                ),
        }
    }
}
