//! Test utilities and shared fixtures.

/// Test logging utilities
#[cfg(feature = "test-logging")]
pub mod logging {
    use std::sync::Once;
    use tracing_subscriber::{EnvFilter, fmt};

    static INIT: Once = Once::new();

    /// Initialize test logging globally, safe to call multiple times.
    /// Respects `RUST_LOG`; run with `cargo test --features test-logging`.
    pub fn init() {
        INIT.call_once(|| {
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("debug,rusqlite=info"));

            fmt()
                .with_env_filter(env_filter)
                .with_test_writer()
                .with_target(true)
                .with_thread_ids(true)
                .compact()
                .try_init()
                .ok();
        });
    }
}

/// Fixture builders shared by the engine and builder tests.
pub mod fixtures {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;

    use crate::ast::testing::ScriptedParser;
    use crate::ast::{AstNode, NodeKind, ParsedUnit, Reference};
    use crate::index::{ProgressEvent, ProgressObserver};
    use crate::symbol::SourceLocation;

    pub fn loc(path: &Path, offset: u32) -> SourceLocation {
        SourceLocation::new(path, offset, 1, offset + 1)
    }

    /// A temp directory with real (empty) source files for discovery and a
    /// scripted parser supplying their trees.
    pub struct TestProject {
        dir: TempDir,
        pub parser: Arc<ScriptedParser>,
    }

    impl TestProject {
        pub fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                parser: Arc::new(ScriptedParser::new()),
            }
        }

        pub fn root(&self) -> PathBuf {
            std::path::absolute(self.dir.path()).unwrap()
        }

        /// Create the file on disk so discovery finds it; returns the
        /// absolute path to script and query with.
        pub fn add_source(&self, name: &str) -> PathBuf {
            let path = self.root().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
            path
        }

        pub fn script(&self, unit: ParsedUnit) {
            self.parser.script(unit);
        }
    }

    pub fn func_reference() -> Reference {
        Reference {
            usr: "c:@F@func".into(),
            spelling: "func".into(),
            kind: NodeKind::Function,
            is_definition: false,
            location: None,
        }
    }

    /// `func` defined at offset 42.
    pub fn def_unit(path: &Path) -> ParsedUnit {
        let func = AstNode::new(NodeKind::Function, 42, 90)
            .with_spelling("func")
            .with_usr("c:@F@func")
            .at(loc(path, 42))
            .definition();
        let root = AstNode::new(NodeKind::TranslationUnit, 0, 200)
            .at(loc(path, 0))
            .with_child(func);
        ParsedUnit::new(path, root)
    }

    /// `main` at offset 5 calling `func` at offset 117.
    pub fn ref_unit(path: &Path) -> ParsedUnit {
        let call = AstNode::new(NodeKind::Call, 117, 126)
            .with_spelling("func")
            .at(loc(path, 117))
            .refers_to(func_reference());
        let main_fn = AstNode::new(NodeKind::Function, 5, 160)
            .with_spelling("main")
            .with_usr("c:@F@main")
            .at(loc(path, 5))
            .definition()
            .with_child(call);
        let root = AstNode::new(NodeKind::TranslationUnit, 0, 200)
            .at(loc(path, 0))
            .with_child(main_fn);
        ParsedUnit::new(path, root)
    }

    /// `class C3 {}; class C2 : C3 {}; class C1 : C2 {};` with C3 at offset
    /// 10, C2 at 50 and C1 at 100.
    pub fn class_chain_unit(path: &Path) -> ParsedUnit {
        fn class_usr(name: &str) -> String {
            format!("c:@S@{name}")
        }

        fn class_def(
            path: &Path,
            name: &str,
            offset: u32,
            base: Option<(&str, u32)>,
        ) -> AstNode {
            let mut node = AstNode::new(NodeKind::Class, offset, offset + 40)
                .with_spelling(name)
                .with_usr(class_usr(name))
                .at(loc(path, offset))
                .definition();
            if let Some((base_name, base_offset)) = base {
                node = node.with_child(
                    AstNode::new(NodeKind::BaseSpecifier, offset + 10, offset + 12)
                        .with_spelling(base_name)
                        .at(loc(path, offset + 10))
                        .refers_to(Reference {
                            usr: class_usr(base_name),
                            spelling: base_name.into(),
                            kind: NodeKind::Class,
                            is_definition: true,
                            location: Some(loc(path, base_offset)),
                        }),
                );
            }
            node
        }

        let root = AstNode::new(NodeKind::TranslationUnit, 0, 300)
            .at(loc(path, 0))
            .with_child(class_def(path, "C3", 10, None))
            .with_child(class_def(path, "C2", 50, Some(("C3", 10))))
            .with_child(class_def(path, "C1", 100, Some(("C2", 50))));
        ParsedUnit::new(path, root)
    }

    /// Progress observer that records every event it sees.
    #[derive(Default)]
    pub struct EventLog(Mutex<Vec<ProgressEvent>>);

    impl EventLog {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn events(&self) -> Vec<ProgressEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ProgressObserver for EventLog {
        fn on_progress(&self, event: &ProgressEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }
}
