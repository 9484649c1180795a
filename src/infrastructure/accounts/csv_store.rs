//! Accounts file: one `user,password_hash,net_id,net_id_password` line per
//! account, no header row.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::debug;

use crate::domain::{Account, AccountStore, DomainError, DomainResult};
use crate::shared::InfraError;

const FIELDS: usize = 4;

pub struct CsvAccountStore {
    path: PathBuf,
}

impl CsvAccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn account_from(record: &StringRecord, line: u64) -> DomainResult<Account> {
    if record.len() != FIELDS {
        return Err(DomainError::Storage(format!(
            "accounts file line {line}: expected {FIELDS} fields, found {}",
            record.len()
        )));
    }
    Ok(Account {
        user: record[0].to_string(),
        password_hash: record[1].to_string(),
        net_id: record[2].to_string(),
        net_id_password: record[3].to_string(),
    })
}

fn create_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

impl AccountStore for CsvAccountStore {
    fn load(&self) -> DomainResult<Vec<Account>> {
        let file = File::open(&self.path).map_err(InfraError::from)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut accounts = Vec::new();
        for result in reader.records() {
            let record = result.map_err(InfraError::from)?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            if record.iter().all(str::is_empty) {
                continue;
            }
            accounts.push(account_from(&record, line)?);
        }
        debug!(path = %self.path.display(), accounts = accounts.len(), "Read accounts file");
        Ok(accounts)
    }

    /// Write to a sibling temp file, then rename over the original.
    fn save(&self, accounts: &[Account]) -> DomainResult<()> {
        let tmp = self.tmp_path();
        let file = create_private(&tmp).map_err(InfraError::from)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        for account in accounts {
            writer
                .write_record([
                    account.user.as_str(),
                    account.password_hash.as_str(),
                    account.net_id.as_str(),
                    account.net_id_password.as_str(),
                ])
                .map_err(InfraError::from)?;
        }
        let mut file = writer
            .into_inner()
            .map_err(|e| InfraError::Io(e.into_error()))?;
        file.flush().map_err(InfraError::from)?;
        file.sync_all().map_err(InfraError::from)?;

        fs::rename(&tmp, &self.path).map_err(InfraError::from)?;
        debug!(path = %self.path.display(), accounts = accounts.len(), "Wrote accounts file");
        Ok(())
    }
}
