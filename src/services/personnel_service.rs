// src/services/personnel_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        cache::{CacheEntity, CacheKey, QueryCache},
        error::AppError,
    },
    db::{personnel_repo::UpsertOutcome, PersonnelRepository},
    models::personnel::{ImportSummary, PersonnelCsvRow, PersonnelMinimal, PersonnelProfile},
};

/// Serializa as fichas em CSV com cabeçalho. Campos com vírgula, aspas ou
/// quebra de linha saem entre aspas.
pub fn write_personnel_csv(rows: &[PersonnelCsvRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar CSV: {}", e))?;
    Ok(String::from_utf8(bytes).map_err(anyhow::Error::from)?)
}

pub fn parse_personnel_csv(data: &str) -> Result<Vec<PersonnelCsvRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    for record in reader.deserialize::<PersonnelCsvRow>() {
        rows.push(record?);
    }
    Ok(rows)
}

#[derive(Clone)]
pub struct PersonnelService {
    personnel_repo: PersonnelRepository,
    cache: QueryCache,
}

impl PersonnelService {
    pub fn new(personnel_repo: PersonnelRepository, cache: QueryCache) -> Self {
        Self { personnel_repo, cache }
    }

    // list_personnel_profiles_minimal
    pub async fn list_minimal(&self) -> Result<Vec<PersonnelMinimal>, AppError> {
        let repo = self.personnel_repo.clone();
        self.cache
            .get_or_load(CacheKey::new(CacheEntity::Personnel, "minimal"), || async move {
                repo.list_minimal(repo.pool()).await
            })
            .await
    }

    /// Chamar depois do commit de uma importação.
    pub async fn invalidate_personnel(&self) {
        self.cache.invalidate_entity(CacheEntity::Personnel).await;
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<PersonnelProfile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.personnel_repo
            .find_by_id(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("personnel {id}")))
    }

    pub async fn export_csv<'e, E>(&self, executor: E) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profiles = self.personnel_repo.list_all(executor).await?;
        let rows: Vec<PersonnelCsvRow> = profiles.iter().map(PersonnelCsvRow::from).collect();
        write_personnel_csv(&rows)
    }

    /// Importa tudo numa transação: com e-mail faz upsert, sem e-mail insere.
    /// Linhas sem nome são ignoradas.
    pub async fn import_csv<'e, E>(&self, executor: E, data: &str) -> Result<ImportSummary, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        // 1. Parse antes de abrir a transação
        let rows = parse_personnel_csv(data)?;

        let mut tx = executor.begin().await?;
        let mut summary = ImportSummary::default();

        // 2. Grava linha a linha
        for mut row in rows {
            if row.first_name.trim().is_empty() || row.last_name.trim().is_empty() {
                summary.skipped += 1;
                continue;
            }
            // e-mail é a chave do upsert: normaliza espaços
            row.email = row
                .email
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty());

            if row.email.is_some() {
                match self.personnel_repo.upsert_by_email(&mut *tx, &row).await? {
                    UpsertOutcome::Inserted => summary.inserted += 1,
                    UpsertOutcome::Updated => summary.updated += 1,
                }
            } else {
                self.personnel_repo.insert(&mut *tx, &row).await?;
                summary.inserted += 1;
            }
        }

        tx.commit().await?;

        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            "importação de pessoal concluída"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(first: &str, last: &str, email: Option<&str>, title: Option<&str>) -> PersonnelCsvRow {
        PersonnelCsvRow {
            first_name: first.into(),
            last_name: last.into(),
            email: email.map(Into::into),
            phone: None,
            department: Some("Secretaria".into()),
            title: title.map(Into::into),
            is_active: true,
        }
    }

    #[test]
    fn rows_with_delimiters_quotes_and_newlines_survive() {
        let rows = vec![
            row("Ana", "Lima", Some("ana@tribunal.gov"), Some("Técnica, Nível II")),
            row("Bruno", "O\"Neil", None, Some("Oficial\nPlantonista")),
        ];

        let csv = write_personnel_csv(&rows).unwrap();
        // o terceiro campo da primeira linha precisa sair entre aspas
        assert!(csv.contains("\"Técnica, Nível II\""));

        let parsed = parse_personnel_csv(&csv).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn surrounding_spaces_inside_values_are_kept() {
        let rows = vec![row("Ana", "Lima", None, Some("  Assessora  "))];

        let csv = write_personnel_csv(&rows).unwrap();
        let parsed = parse_personnel_csv(&csv).unwrap();
        assert_eq!(parsed[0].title.as_deref(), Some("  Assessora  "));

        let quoted = "first_name,last_name,title\nAna,Lima,\" Técnica \"\n";
        let parsed = parse_personnel_csv(quoted).unwrap();
        assert_eq!(parsed[0].title.as_deref(), Some(" Técnica "));
    }

    #[test]
    fn padded_headers_still_match_fields() {
        let data = " first_name , last_name \nCarla,Dias\n";
        let parsed = parse_personnel_csv(data).unwrap();
        assert_eq!(parsed[0].first_name, "Carla");
        assert_eq!(parsed[0].last_name, "Dias");
    }

    #[test]
    fn header_is_written_once() {
        let csv = write_personnel_csv(&[row("Ana", "Lima", None, None)]).unwrap();
        let first_line = csv.lines().next().unwrap();
        assert_eq!(first_line, "first_name,last_name,email,phone,department,title,is_active");
        assert_eq!(csv.matches("first_name").count(), 1);
    }

    #[test]
    fn optional_columns_may_be_missing() {
        let data = "first_name,last_name\nCarla,Dias\n";
        let parsed = parse_personnel_csv(data).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].email, None);
        assert!(parsed[0].is_active);
    }

    #[test]
    fn malformed_csv_is_reported() {
        let data = "first_name,last_name,is_active\nCarla,Dias,talvez\n";
        assert!(matches!(parse_personnel_csv(data), Err(AppError::CsvError(_))));
    }

    #[sqlx::test]
    async fn import_counts_inserts_updates_and_skips(pool: sqlx::PgPool) {
        let svc = PersonnelService::new(
            PersonnelRepository::new(pool.clone()),
            QueryCache::new(100, std::time::Duration::from_secs(60)),
        );
        assert!(svc.list_minimal().await.unwrap().is_empty());

        let data = "first_name,last_name,email,title\n\
                    Ana,Lima,ana@tribunal.gov,Técnica\n\
                    Bruno,Souza,,Oficial\n\
                    ,SemNome,x@tribunal.gov,\n";
        let summary = svc.import_csv(&pool, data).await.unwrap();
        assert_eq!(summary, ImportSummary { inserted: 2, updated: 0, skipped: 1 });

        // mesmo e-mail, com espaços e maiúsculas: atualiza em vez de duplicar
        let again = "first_name,last_name,email,title\nAna,Lima, ANA@tribunal.gov ,\" Analista \"\n";
        let summary = svc.import_csv(&pool, again).await.unwrap();
        assert_eq!(summary, ImportSummary { inserted: 0, updated: 1, skipped: 0 });

        svc.invalidate_personnel().await;
        let listed = svc.list_minimal().await.unwrap();
        assert_eq!(listed.len(), 2);
        let ana = listed.iter().find(|p| p.full_name == "Ana Lima").unwrap();
        assert_eq!(ana.title.as_deref(), Some(" Analista "));
    }

    #[sqlx::test]
    async fn malformed_import_writes_nothing(pool: sqlx::PgPool) {
        let svc = PersonnelService::new(
            PersonnelRepository::new(pool.clone()),
            QueryCache::new(100, std::time::Duration::from_secs(60)),
        );
        let data = "first_name,last_name,is_active\nAna,Lima,true\nCarla,Dias,talvez\n";

        assert!(matches!(svc.import_csv(&pool, data).await, Err(AppError::CsvError(_))));
        assert!(svc.export_csv(&pool).await.unwrap().lines().nth(1).is_none());
    }
}
