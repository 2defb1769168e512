//! 本地导出命令行工具：
//! - 以访问口令通过闸门（与表单页 `?key=` 相同的比较规则）
//! - 调用导出接口并把结果写入本地目录（`<collection>_<unix 毫秒>.json`）

use std::env;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use collection_export::AppConfig;
use collection_export::app::normalize_prefix;
use collection_export::form::{
    AccessGate, DirectorySink, ExportForm, HttpExportTransport, SubmitOutcome,
};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_API_KEY_ENV: &str = "API_KEY";
const DEFAULT_OUT_DIR: &str = ".";

#[derive(Debug, Clone, Default)]
struct Args {
    help: bool,
    base_url: Option<String>,
    api_prefix: Option<String>,
    database: Option<String>,
    collection: Option<String>,
    api_key: Option<String>,
    api_key_env: Option<String>,
    access_key: Option<String>,
    out_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

#[derive(Debug)]
enum CliError {
    Args(String),
    Config(String),
    Denied,
    Export(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Args(msg) => write!(f, "参数错误: {msg}"),
            CliError::Config(msg) => write!(f, "配置错误: {msg}"),
            CliError::Denied => write!(
                f,
                "Access Denied\nFormat: --access-key YOUR_ACCESS_KEY"
            ),
            CliError::Export(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {}

#[derive(Debug, Clone)]
struct RuntimeDefaults {
    base_url: String,
    api_prefix: String,
    access_key: Option<String>,
}

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let code = match run(env::args().skip(1).collect()).await {
        Ok(()) => 0,
        Err(CliError::Args(msg)) => {
            eprintln!("参数错误: {msg}");
            print_help();
            2
        }
        Err(err @ CliError::Denied) => {
            eprintln!("{err}");
            2
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(argv: Vec<String>) -> Result<(), CliError> {
    let args = Args::parse(argv)?;
    if args.help {
        print_help();
        return Ok(());
    }

    let defaults = load_runtime_defaults();

    let gate = AccessGate::new(defaults.access_key.as_deref()).evaluate(args.access_key.as_deref());
    let form = ExportForm::open(gate).ok_or(CliError::Denied)?;

    let database = args
        .database
        .ok_or_else(|| CliError::Args("缺少 --database".to_string()))?;
    let collection = args
        .collection
        .ok_or_else(|| CliError::Args("缺少 --collection".to_string()))?;
    let api_key = resolve_api_key(
        args.api_key,
        args.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV),
    )?;
    form.set_database(database);
    form.set_collection(collection);
    form.set_api_key(api_key);

    let client = match args.timeout_secs {
        Some(secs) => collection_export::http::client_with_timeout(Duration::from_secs(secs)),
        None => collection_export::http::client_default().cloned(),
    }
    .map_err(|e| CliError::Config(format!("创建 HTTP Client 失败: {e}")))?;

    let base_url = args.base_url.unwrap_or(defaults.base_url);
    let prefix = args.api_prefix.unwrap_or(defaults.api_prefix);
    let transport = HttpExportTransport::from_base(client, &base_url, &normalize_prefix(&prefix))
        .map_err(|e| CliError::Config(e.to_string()))?;
    let sink = DirectorySink::new(args.out_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)));

    match form.submit(&transport, &sink).await {
        SubmitOutcome::Downloaded { file_name, .. } => {
            if let Some(msg) = form.snapshot().success {
                println!("{msg}");
            }
            println!("{}", sink.dir().join(file_name).display());
            Ok(())
        }
        SubmitOutcome::Failed(msg) => Err(CliError::Export(msg)),
        SubmitOutcome::Ignored => Err(CliError::Export("上一次导出仍在进行".to_string())),
    }
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, CliError> {
        let mut args = Args::default();
        let mut iter = argv.into_iter();

        while let Some(flag) = iter.next() {
            let mut value = |name: &str| {
                iter.next()
                    .ok_or_else(|| CliError::Args(format!("缺少 {name} 的值")))
            };
            match flag.as_str() {
                "-h" | "--help" => args.help = true,
                "--base-url" => args.base_url = Some(value("--base-url")?),
                "--api-prefix" => args.api_prefix = Some(value("--api-prefix")?),
                "--database" => args.database = Some(value("--database")?),
                "--collection" => args.collection = Some(value("--collection")?),
                "--api-key" => args.api_key = Some(value("--api-key")?),
                "--api-key-env" => args.api_key_env = Some(value("--api-key-env")?),
                "--access-key" => args.access_key = Some(value("--access-key")?),
                "--out-dir" => args.out_dir = Some(PathBuf::from(value("--out-dir")?)),
                "--timeout-secs" => {
                    let raw = value("--timeout-secs")?;
                    args.timeout_secs = Some(raw.parse().map_err(|_| {
                        CliError::Args(format!("--timeout-secs 需要整数，收到: {raw}"))
                    })?);
                }
                unknown => return Err(CliError::Args(format!("不支持的参数: {unknown}"))),
            }
        }
        Ok(args)
    }
}

fn load_runtime_defaults() -> RuntimeDefaults {
    match AppConfig::load() {
        Ok(cfg) => {
            let host = if cfg.server.host == "0.0.0.0" {
                "127.0.0.1".to_string()
            } else {
                cfg.server.host.clone()
            };
            RuntimeDefaults {
                base_url: format!("http://{}:{}", host, cfg.server.port),
                api_prefix: cfg.api.prefix.clone(),
                access_key: cfg.export.access_key().map(str::to_string),
            }
        }
        Err(e) => {
            tracing::warn!("读取配置失败，使用默认值: {}", e);
            RuntimeDefaults {
                base_url: DEFAULT_BASE_URL.to_string(),
                api_prefix: "/api".to_string(),
                access_key: None,
            }
        }
    }
}

fn resolve_api_key(from_arg: Option<String>, env_name: &str) -> Result<String, CliError> {
    if let Some(v) = from_arg.filter(|v| !v.is_empty()) {
        return Ok(v);
    }
    if let Ok(v) = env::var(env_name)
        && !v.is_empty()
    {
        return Ok(v);
    }
    Err(CliError::Args(format!(
        "缺少 API 密钥：请使用 --api-key 或设置环境变量 {env_name}"
    )))
}

fn print_help() {
    println!(
        r#"export_cli（集合导出本地工具）

参数：
  --access-key KEY          访问口令（与表单页 ?key= 相同，对照配置 ACCESS_KEY）
  --database NAME           数据库名
  --collection NAME         集合名
  --api-key KEY             导出接口密钥（Header: x-api-key）
  --api-key-env NAME        从环境变量读取密钥（默认 API_KEY）
  --base-url URL            服务根地址（默认从 config 解析，否则 http://127.0.0.1:3000）
  --api-prefix PREFIX       接口前缀（默认从 config 解析，否则 /api）
  --out-dir DIR             输出目录（默认当前目录）
  --timeout-secs N          请求总超时秒数（默认不限）
  -h, --help                显示帮助
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_flags() {
        let a = Args::parse(argv(&[
            "--database",
            "shop",
            "--collection",
            "orders",
            "--api-key",
            "k",
            "--access-key",
            "a",
            "--out-dir",
            "/tmp/out",
            "--timeout-secs",
            "5",
        ]))
        .expect("parse");
        assert_eq!(a.database.as_deref(), Some("shop"));
        assert_eq!(a.collection.as_deref(), Some("orders"));
        assert_eq!(a.api_key.as_deref(), Some("k"));
        assert_eq!(a.access_key.as_deref(), Some("a"));
        assert_eq!(a.out_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(a.timeout_secs, Some(5));
    }

    #[test]
    fn missing_value_and_unknown_flag_are_errors() {
        assert!(matches!(
            Args::parse(argv(&["--database"])),
            Err(CliError::Args(_))
        ));
        assert!(matches!(
            Args::parse(argv(&["--nope"])),
            Err(CliError::Args(_))
        ));
        assert!(matches!(
            Args::parse(argv(&["--timeout-secs", "x"])),
            Err(CliError::Args(_))
        ));
    }

    #[test]
    fn explicit_api_key_wins() {
        assert_eq!(
            resolve_api_key(Some("k".into()), "EXPORT_CLI_TEST_UNSET_VAR").expect("key"),
            "k"
        );
        assert!(resolve_api_key(None, "EXPORT_CLI_TEST_UNSET_VAR").is_err());
    }
}
