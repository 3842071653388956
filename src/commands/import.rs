use crate::args::ImportArgs;
use crate::commands::Out;
use crate::store::{read_import, ImportFormat, MergeReport};
use crate::{Config, Result};
use anyhow::Context;
use tracing::debug;

/// Merges the transactions in `args.file()` into the store. A backup of the store is written
/// before it is overwritten.
pub async fn import(config: Config, args: ImportArgs) -> Result<Out<MergeReport>> {
    let format = match args.format() {
        Some(format) => format,
        None => ImportFormat::from_path(args.file()).with_context(|| {
            format!(
                "Cannot tell the format of '{}', pass --format json or --format csv",
                args.file().display()
            )
        })?,
    };
    debug!("Importing {} as {format}", args.file().display());

    let incoming = read_import(args.file(), format).await?;
    let mut store = config.store().await?;
    let report = store.merge(incoming)?;
    config.save_store(&store).await?;

    Ok(Out::new(
        format!(
            "Imported {} new and {} updated transactions, {} in the store",
            report.added,
            report.replaced,
            store.len()
        ),
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use crate::utils;

    #[tokio::test]
    async fn test_import_json_then_csv() {
        let env = TestEnv::new().await;
        let json_path = env.path("parcelas.json");
        utils::write(
            &json_path,
            r#"[
                {"id": "a", "descricao": "Curso (1/2)", "valor": 100, "periodicidade": "mensal",
                 "quantidadeParcelas": 2, "parcelaAtual": 1, "status": "pendente"},
                {"id": "a2", "descricao": "Curso (2/2)", "valor": 100, "periodicidade": "mensal",
                 "quantidadeParcelas": 2, "parcelaAtual": 2, "transacaoPaiId": "a"}
            ]"#,
        )
        .await
        .unwrap();

        let out = import(env.config(), ImportArgs::new(&json_path, None))
            .await
            .unwrap();
        assert_eq!(
            out.structure(),
            Some(&MergeReport {
                added: 2,
                replaced: 0
            })
        );

        let csv_path = env.path("baixa.txt");
        utils::write(&csv_path, "id,descricao,valor,status\na,Curso (1/2),100,pago\n")
            .await
            .unwrap();
        let out = import(
            env.config(),
            ImportArgs::new(&csv_path, Some(ImportFormat::Csv)),
        )
        .await
        .unwrap();
        assert_eq!(out.structure().unwrap().replaced, 1);

        let store = env.config().store().await.unwrap();
        assert_eq!(store.len(), 2);
        // the CSV row replaced the whole transaction, not just its status
        assert!(store.transactions()[0].periodicity().is_none());
        assert!(store.transactions()[0].is_settled());

        let mut backups = utils::read_dir(env.config().backups()).await.unwrap();
        let mut count = 0;
        while backups.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_import_unknown_extension() {
        let env = TestEnv::new().await;
        let path = env.path("dump.txt");
        utils::write(&path, "[]").await.unwrap();
        assert!(import(env.config(), ImportArgs::new(&path, None))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_import_bad_file_leaves_store_untouched() {
        let env = TestEnv::new().await;
        env.insert(vec![crate::model::Transaction::new(
            "x",
            "Luz",
            crate::model::Amount::ZERO,
        )])
        .await;
        let path = env.path("broken.json");
        utils::write(&path, "{ not json").await.unwrap();
        assert!(import(env.config(), ImportArgs::new(&path, None))
            .await
            .is_err());
        assert_eq!(env.config().store().await.unwrap().len(), 1);
    }
}
