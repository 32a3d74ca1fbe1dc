//! Test identifiers and their mapping onto log directories.
use std::fmt;
use std::path::PathBuf;

/// Identifier of a single test case.
///
/// Written as a `::`-separated path (`suite::module::test_name`), optionally
/// followed by a bracketed parameter suffix for parametrised cases
/// (`suite::test_param[2-abc]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestId(String);

impl TestId {
    /// Wrap an identifier as-is.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Append a parameter suffix, producing `id[param]`.
    #[must_use]
    pub fn with_param(self, param: impl fmt::Display) -> Self {
        Self(format!("{}[{param}]", self.0))
    }

    /// Build an identifier from the type name of a function nested in a test.
    ///
    /// Drops the trailing helper segment and any `{{closure}}` segments so
    /// that `my_tests::writes_logs::{{closure}}::f` becomes
    /// `my_tests::writes_logs`. Used by [`current_test!`](crate::current_test).
    #[must_use]
    pub fn from_fn_path(path: &str) -> Self {
        let mut segments: Vec<&str> = path.split("::").collect();
        segments.pop();
        while segments.last().is_some_and(|s| *s == "{{closure}}") {
            segments.pop();
        }
        Self(segments.join("::"))
    }

    /// Identifier of the test running on the current thread.
    ///
    /// libtest names each test thread after the test it runs; returns `None`
    /// on unnamed threads and on the main thread.
    #[must_use]
    pub fn from_thread() -> Option<Self> {
        std::thread::current()
            .name()
            .filter(|name| *name != "main")
            .map(Self::new)
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory of this test relative to the logs directory.
    ///
    /// Empty, `.` and `..` segments are dropped so the directory always
    /// stays below the logs directory.
    #[must_use]
    pub fn relative_dir(&self) -> PathBuf {
        sanitize_nodeid(&self.0)
            .split('/')
            .filter(|part| !matches!(*part, "" | "." | ".."))
            .collect()
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Expands to the [`TestId`] of the enclosing function.
///
/// ```
/// fn writes_logs() -> testlogger::TestId {
///     testlogger::current_test!()
/// }
/// assert!(writes_logs().as_str().ends_with("writes_logs"));
/// ```
#[macro_export]
macro_rules! current_test {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::TestId::from_fn_path(type_name_of(f))
    }};
}

/// Turn a test identifier into a relative, `/`-separated directory path.
///
/// Path separators become `/` everywhere, parameters included; a bracketed
/// parameter suffix is then attached to the test name with `-`, with
/// slashes inside the parameters turned into dashes.
///
/// # Examples
///
/// ```
/// use testlogger::sanitize_nodeid;
///
/// assert_eq!(sanitize_nodeid("suite::test_echo"), "suite/test_echo");
/// assert_eq!(
///     sanitize_nodeid("suite::test_param[x-a/b]"),
///     "suite/test_param-x-a-b"
/// );
/// ```
#[must_use]
pub fn sanitize_nodeid(nodeid: &str) -> String {
    let nodeid = nodeid.replace("::", "/");
    let (path, params) = split_params(&nodeid);
    let mut out = path.to_string();
    if let Some(params) = params {
        out.push('-');
        out.push_str(&sanitize_params(params));
    }
    out
}

/// Split `name[params]` into `name` and `params`; brackets are matched
/// greedily from the first `[` to the last `]`.
fn split_params(nodeid: &str) -> (&str, Option<&str>) {
    match (nodeid.find('['), nodeid.rfind(']')) {
        (Some(open), Some(close)) if close > open + 1 => nodeid
            .get(..open)
            .zip(nodeid.get(open + 1..close))
            .map_or((nodeid, None), |(path, params)| (path, Some(params))),
        _ => (nodeid, None),
    }
}

fn sanitize_params(params: &str) -> String {
    let mut out = String::with_capacity(params.len());
    for c in params.chars() {
        let c = if c == '/' { '-' } else { c };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out
}
