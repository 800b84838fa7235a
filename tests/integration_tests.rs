//! Integration tests for the pyedit crate.

use pretty_assertions::assert_eq;
use pyedit::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_add_attribute_after_docstring() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "models.py", "class User:\n    \"\"\"A user.\"\"\"\n");
    let session = Session::open(dir.path()).unwrap();

    let result = session
        .find_class("User")
        .add_attribute("email", Some("str"), Some("\"\""));

    assert!(result.success, "{}", result.message);
    assert_eq!(
        read(&path),
        "class User:\n    \"\"\"A user.\"\"\"\n\n    email: str = \"\"\n"
    );
}

#[test]
fn test_add_parameter_at_end() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "jobs.py",
        "class Job:\n    def run(self, x):\n        return x\n",
    );
    let session = Session::open(dir.path()).unwrap();

    let result = session.find_class("Job").find_method("run").add_parameter(
        ParameterSpec::new("timeout")
            .annotation("int")
            .default_value("30")
            .position(ParameterPosition::End),
    );

    assert!(result.success, "{}", result.message);
    assert_eq!(
        read(&path),
        "class Job:\n    def run(self, x, timeout: int = 30):\n        return x\n"
    );
}

#[test]
fn test_adds_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "svc.py",
        "class Service:\n    def call(self, request):\n        return request\n",
    );
    let session = Session::open(dir.path()).unwrap();
    let call = session.find_class("Service").find_method("call");

    assert!(call.add_decorator("retry(3)").success);
    assert!(call.add_parameter(ParameterSpec::new("timeout")).success);
    let after_first = read(&path);

    let decorator = call.add_decorator("retry(5)");
    let parameter = call.add_parameter(ParameterSpec::new("timeout"));
    assert!(decorator.success && parameter.success);
    assert!(decorator.files_changed.is_empty());
    assert!(parameter.files_changed.is_empty());
    assert_eq!(read(&path), after_first);
    assert!(after_first.contains("    @retry(3)\n    def call(self, request, timeout):"));
}

#[test]
fn test_rename_respects_nested_scopes() {
    let dir = TempDir::new().unwrap();
    let source = "\
class Foo:
    def bar(self):
        return 1


class FooBar:
    class Foo:
        def bar(self):
            return 2
";
    let path = write(dir.path(), "shapes.py", source);
    let session = Session::open(dir.path()).unwrap();

    let foo = session.find_class("Foo");
    assert_eq!(foo.line_number(), Some(1));
    assert!(foo.rename("Baz").success);

    let text = read(&path);
    assert!(text.starts_with("class Baz:\n"));
    assert!(text.contains("class FooBar:\n    class Foo:\n"));

    let nested = session.find_class("FooBar").find_class("Foo").find_method("bar");
    assert!(nested.rename("baz").success);
    let text = read(&path);
    assert!(text.contains("    def bar(self):\n        return 1"));
    assert!(text.contains("        def baz(self):\n            return 2"));
}

#[test]
fn test_error_target_reports_first_failure() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.py", "class Present:\n    pass\n");
    let session = Session::open(dir.path()).unwrap();

    let result = session.find_class("Missing").find_method("x").rename("y");
    assert!(!result.success);
    assert_eq!(result.kind(), Some(ErrorKind::NotFound));
    assert_eq!(result.message, "Class 'Missing' not found");
    assert!(result.raise_if_error().is_err());
}

#[test]
fn test_transaction_commit_is_atomic() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.py", "class A:\n    pass\n");
    let b = write(dir.path(), "b.py", "class B:\n    pass\n");
    let c = write(dir.path(), "c.py", "class C:\n    pass\n");
    let session = Session::open(dir.path()).unwrap();

    let mut tx = session.begin_transaction().unwrap();
    for name in ["A", "B", "C"] {
        let result = session.find_class(name).add_attribute("id", Some("int"), None);
        assert!(result.message.starts_with("[PENDING]"), "{}", result.message);
    }
    assert_eq!(tx.pending_files(), vec![a.clone(), b.clone(), c.clone()]);

    // Writing c.py fails once it has become a directory.
    fs::remove_file(&c).unwrap();
    fs::create_dir(&c).unwrap();

    let batch = tx.commit();
    assert_eq!(batch.len(), 1);
    assert!(!batch.success());
    assert_eq!(batch.failed()[0].kind(), Some(ErrorKind::WriteFailed));
    assert!(batch.failed()[0].message.starts_with("Transaction failed, rolled back"));
    assert_eq!(read(&a), "class A:\n    pass\n");
    assert_eq!(read(&b), "class B:\n    pass\n");
    assert_eq!(tx.state(), TransactionState::RolledBack);
}

#[test]
fn test_transaction_merges_repeat_edits() {
    let dir = TempDir::new().unwrap();
    let original = "class User:\n    pass\n";
    let path = write(dir.path(), "models.py", original);
    let session = Session::open(dir.path()).unwrap();
    let user = session.find_class("User");

    let mut tx = session.begin_transaction().unwrap();
    assert!(user.add_attribute("name", Some("str"), None).success);
    assert!(user.add_attribute("age", Some("int"), Some("0")).success);

    let change = tx.pending_change(&path).unwrap();
    assert_eq!(tx.len(), 1);
    assert_eq!(change.original_content, original);
    assert_eq!(change.new_content, "class User:\n    age: int = 0\n    name: str\n");
    assert_eq!(
        change.operation,
        "add attribute name to User, add attribute age to User"
    );
    assert_eq!(read(&path), original);

    assert!(tx.commit().success());
    assert_eq!(read(&path), "class User:\n    age: int = 0\n    name: str\n");

    let again = tx.commit();
    assert_eq!(again.failed()[0].kind(), Some(ErrorKind::AlreadyFinalized));
}

#[test]
fn test_rollback_discards_changes() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "util.py", "def helper():\n    pass\n");
    let session = Session::open(dir.path()).unwrap();

    let mut tx = session.begin_transaction().unwrap();
    session.find_function("helper").convert_to_async();
    let result = tx.rollback();
    assert!(result.success);
    assert_eq!(result.message, "Rolled back 1 pending changes");
    assert_eq!(read(&path), "def helper():\n    pass\n");
    assert_eq!(tx.rollback().kind(), Some(ErrorKind::AlreadyFinalized));
}

#[test]
fn test_dry_run_is_pure() {
    let dir = TempDir::new().unwrap();
    let source = "def load(path):\n    return open(path).read()\n";
    let path = write(dir.path(), "io_utils.py", source);
    let before = fs::metadata(&path).unwrap().modified().unwrap();

    let dry = Session::new(SessionConfig::new(dir.path()).dry_run(true)).unwrap();
    let preview = dry
        .find_function("load")
        .add_parameter(ParameterSpec::new("encoding").default_value("\"utf-8\""));
    assert!(preview.success);
    assert!(preview.message.starts_with("[DRY RUN]"));
    assert_eq!(read(&path), source);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);

    let real = Session::open(dir.path()).unwrap();
    let applied = real
        .find_function("load")
        .add_parameter(ParameterSpec::new("encoding").default_value("\"utf-8\""));
    assert!(applied.success);
    assert_eq!(preview.diff, applied.diff);
    assert!(read(&path).contains("def load(path, encoding=\"utf-8\"):"));
}

#[test]
fn test_dry_run_transaction_commit() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.py", "def f():\n    pass\n");
    let b = write(dir.path(), "b.py", "def g():\n    pass\n");
    let session = Session::new(SessionConfig::new(dir.path()).dry_run(true)).unwrap();

    let mut tx = session.begin_transaction().unwrap();
    session.find_function("f").rename("f2");
    session.find_function("g").rename("g2");
    let batch = tx.commit();

    assert!(batch.success());
    assert_eq!(batch.len(), 1);
    let result = batch.iter().next().unwrap();
    assert_eq!(result.message, "[DRY RUN] Would apply 2 changes");
    assert_eq!(result.diffs.len(), 2);
    assert!(batch.diff_for(&a).unwrap().contains("+def f2():"));
    assert!(batch.diff_for(&b).unwrap().contains("+def g2():"));
    assert_eq!(read(&a), "def f():\n    pass\n");
    assert_eq!(read(&b), "def g():\n    pass\n");
}

#[test]
fn test_batch_operations_across_files() {
    let dir = TempDir::new().unwrap();
    let api = write(
        dir.path(),
        "pkg/api.py",
        "def get_users():\n    return fetch(\"/users\")\n\n\ndef get_orders():\n    return fetch(\"/orders\")\n",
    );
    write(dir.path(), "pkg/admin.py", "def get_stats():\n    return {}\n");
    let session = Session::open(dir.path()).unwrap();

    let getters = session.find_functions("^get_");
    assert_eq!(getters.len(), 3);

    let batch = getters.convert_to_async();
    assert!(batch.success());
    assert_eq!(batch.files_changed().len(), 2);
    assert!(read(&api).contains("async def get_users():"));

    let in_api = getters.in_file(&api);
    let batch = in_api.insert_statement("log(\"called\")", BodyPosition::Start);
    assert!(batch.success());
    assert!(read(&api).contains("async def get_orders():\n    log(\"called\")\n    return fetch"));
}

#[test]
fn test_generate_dunders() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "point.py",
        "class Point:\n    \"\"\"A point.\"\"\"\n\n    x: int\n    y: int = 0\n",
    );
    let session = Session::open(dir.path()).unwrap();
    let point = session.find_class("Point");

    assert!(point.generate_init().success);
    assert!(point.generate_repr().success);
    let text = read(&path);
    assert!(text.contains("    def __init__(self, x: int, y: int = 0) -> None:\n        self.x = x\n        self.y = y\n"));
    assert!(text.contains("    def __repr__(self) -> str:\n"));

    let again = point.generate_init();
    assert!(again.success);
    assert!(again.files_changed.is_empty());
}

#[test]
fn test_insert_at_match_in_method() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "worker.py",
        "class Worker:\n    def process(self, item):\n        data = load(item)\n        return save(data)\n",
    );
    let session = Session::open(dir.path()).unwrap();
    let process = session.find_class("Worker").find_method("process");

    assert!(process.insert_after_match(r"data = load", "validate(data)").success);
    assert!(process.replace_match(r"return save", "return save(data, force=True)").success);
    assert_eq!(
        read(&path),
        "class Worker:\n    def process(self, item):\n        data = load(item)\n        validate(data)\n        return save(data, force=True)\n"
    );

    let missing = process.insert_before_match(r"nothing_here", "pass");
    assert_eq!(missing.kind(), Some(ErrorKind::NotFound));
}

#[test]
fn test_glob_root_and_excludes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app/models.py", "class User:\n    pass\n");
    write(dir.path(), "app/tests/test_models.py", "class User:\n    pass\n");

    let config = SessionConfig::new(dir.path()).exclude("**/tests/**");
    let session = Session::new(config).unwrap();
    let users = session.find_classes("^User$");
    assert_eq!(users.len(), 1);
    assert_eq!(
        users.first().and_then(|t| t.file_path()),
        Some(dir.path().join("app/models.py"))
    );

    let pattern = dir.path().join("app/tests/*.py");
    let session = Session::open(pattern).unwrap();
    assert_eq!(session.files().unwrap().len(), 1);
}

#[test]
fn test_move_inside_transaction() {
    let dir = TempDir::new().unwrap();
    let app = write(
        dir.path(),
        "app.py",
        "def helper():\n    return 1\n\n\ndef main():\n    return helper()\n",
    );
    let utils = dir.path().join("utils.py");
    let session = Session::open(dir.path())
        .unwrap()
        .with_mover(Box::new(ModuleMover::new().with_reexport()));

    let mut tx = session.begin_transaction().unwrap();
    let helper = session.find_function("helper");
    let result = helper.move_to("utils");
    assert!(result.success, "{}", result.message);
    assert!(!utils.exists());
    assert_eq!(tx.len(), 2);

    // Reads inside the transaction see the move, so the handle follows it.
    assert_eq!(helper.file_path(), Some(utils.clone()));
    assert_eq!(helper.line_number(), Some(1));

    assert!(tx.commit().success());
    assert_eq!(read(&utils), "def helper():\n    return 1\n");
    assert_eq!(
        read(&app),
        "from utils import helper\n\n\ndef main():\n    return helper()\n"
    );
}
