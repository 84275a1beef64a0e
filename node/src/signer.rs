//! Signing through the chain's own binary.
//!
//! The unsigned `MsgExec` transaction is written to a temporary file and
//! handed to `<binary> tx authz exec`, which signs with the local keyring
//! and broadcasts. The returned hash is then polled over REST until the
//! transaction is committed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;

use vigil_network::{LcdClient, RestTransport, TxResponse};
use vigil_transactions::{
    Attribute, BroadcastRequest, ChainClient, Event, TransactionError, TxResult,
};

use crate::config::{ChainClientConfig, NetworkOverride};
use crate::NetworkProfiles;

pub struct CliChainClient {
    config: ChainClientConfig,
    profiles: NetworkProfiles,
    transport: Arc<dyn RestTransport>,
    request_timeout: Duration,
}

impl CliChainClient {
    pub fn new(
        config: ChainClientConfig,
        profiles: NetworkProfiles,
        transport: Arc<dyn RestTransport>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            config,
            profiles,
            transport,
            request_timeout,
        }
    }

    fn program(&self, binary: &str) -> PathBuf {
        match &self.config.binary_dir {
            Some(dir) => dir.join(binary),
            None => PathBuf::from(binary),
        }
    }

    /// Arguments of `tx authz exec` for `request`.
    pub fn exec_args(
        &self,
        request: &BroadcastRequest,
        tx_file: &Path,
        rpc_endpoint: &str,
        settings: &NetworkOverride,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "tx".into(),
            "authz".into(),
            "exec".into(),
            tx_file.display().to_string(),
            "--from".into(),
            request.key_name.clone(),
            "--node".into(),
            rpc_endpoint.to_string(),
            "--chain-id".into(),
            request.chain_id.clone(),
            "--keyring-backend".into(),
            self.config.keyring_backend.clone(),
        ];
        if let Some(home) = &self.config.home {
            args.push("--home".into());
            args.push(home.display().to_string());
        }
        args.extend([
            "--gas".into(),
            "auto".into(),
            "--gas-adjustment".into(),
            self.config.gas_adjustment.to_string(),
        ]);
        if let Some(fees) = &self.config.fees {
            args.push("--fees".into());
            args.push(fees.clone());
        } else if let Some(prices) = &settings.gas_prices {
            args.push("--gas-prices".into());
            args.push(prices.clone());
        }
        if !request.memo.is_empty() {
            args.push("--note".into());
            args.push(request.memo.clone());
        }
        args.extend(["--output".into(), "json".into(), "--yes".into()]);
        args
    }

    async fn run_exec(
        &self,
        request: &BroadcastRequest,
        settings: &NetworkOverride,
    ) -> Result<TxResponse, TransactionError> {
        let binary = settings.chain_binary.as_deref().ok_or_else(|| {
            TransactionError::Broadcast(format!(
                "no chain_binary configured for {}",
                request.network
            ))
        })?;
        let rpc_endpoint = settings.rpc_endpoint.as_deref().ok_or_else(|| {
            TransactionError::Broadcast(format!(
                "no rpc_endpoint configured for {}",
                request.network
            ))
        })?;

        let unsigned = request.envelope.unsigned_tx(&request.memo)?;
        let body = serde_json::to_vec(&unsigned)
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        let tx_file = std::env::temp_dir().join(format!(
            "vigil-exec-{}-{}.json",
            request.network,
            hex::encode(rand::random::<[u8; 8]>())
        ));
        tokio::fs::write(&tx_file, body)
            .await
            .map_err(|e| {
                TransactionError::Broadcast(format!("cannot write {}: {e}", tx_file.display()))
            })?;

        let program = self.program(binary);
        let args = self.exec_args(request, &tx_file, rpc_endpoint, settings);
        tracing::debug!(
            network = %request.network,
            program = %program.display(),
            "running authz exec"
        );
        let output = Command::new(&program).args(&args).output().await;
        if let Err(e) = tokio::fs::remove_file(&tx_file).await {
            tracing::warn!(file = %tx_file.display(), error = %e, "temporary tx file not removed");
        }
        let output = output.map_err(|e| {
            TransactionError::Broadcast(format!("cannot run {}: {e}", program.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransactionError::Broadcast(format!(
                "{} exited with {}: {}",
                binary,
                output.status,
                stderr.trim()
            )));
        }
        serde_json::from_slice(&output.stdout).map_err(|e| {
            TransactionError::UnreadableResponse(format!("{binary} output: {e}"))
        })
    }

    async fn wait_for_commit(
        &self,
        rest_endpoint: &str,
        txhash: &str,
    ) -> Result<TxResponse, TransactionError> {
        let lcd = LcdClient::new(self.transport.clone(), rest_endpoint, self.request_timeout);
        let interval = Duration::from_secs(self.config.tx_poll_interval_secs);
        for attempt in 1..=self.config.tx_poll_attempts {
            tokio::time::sleep(interval).await;
            match lcd.tx(txhash).await {
                Ok(Some(tx)) => return Ok(tx),
                Ok(None) => tracing::debug!(txhash, attempt, "transaction not committed yet"),
                Err(e) => tracing::warn!(txhash, attempt, error = %e, "transaction lookup failed"),
            }
        }
        Err(TransactionError::NotCommitted(txhash.to_string()))
    }
}

/// Decoded result of a committed (or rejected) transaction.
pub fn tx_result(tx: &TxResponse) -> TxResult {
    let events = tx
        .plain_events()
        .into_iter()
        .map(|event| Event {
            kind: event.kind,
            attributes: event
                .attributes
                .into_iter()
                .map(|a| Attribute {
                    key: a.key,
                    value: a.value,
                })
                .collect(),
        })
        .collect();
    TxResult {
        code: tx.code,
        raw_log: tx.raw_log.clone(),
        txhash: tx.txhash.clone(),
        events,
    }
}

#[async_trait]
impl ChainClient for CliChainClient {
    async fn sign_and_broadcast(
        &self,
        request: &BroadcastRequest,
    ) -> Result<TxResult, TransactionError> {
        let settings = self
            .profiles
            .get(&request.network)
            .cloned()
            .unwrap_or_default();
        let submitted = self.run_exec(request, &settings).await?;
        if submitted.txhash.is_empty() {
            return Err(TransactionError::UnreadableResponse(
                "broadcast returned no transaction hash".to_string(),
            ));
        }
        // Rejected at CheckTx: never committed, nothing to poll.
        if submitted.code != 0 {
            return Ok(tx_result(&submitted));
        }
        tracing::info!(
            network = %request.network,
            txhash = %submitted.txhash,
            "transaction submitted"
        );
        let committed = self
            .wait_for_commit(&request.rest_endpoint, &submitted.txhash)
            .await?;
        Ok(tx_result(&committed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vigil_nullables::NullTransport;
    use vigil_transactions::{Msg, MsgExec};

    fn request() -> BroadcastRequest {
        BroadcastRequest {
            network: "cosmoshub".into(),
            chain_id: "cosmoshub-4".into(),
            key_name: "sweeper".into(),
            rest_endpoint: "https://lcd.test".into(),
            envelope: MsgExec::new(
                "cosmos1grantee",
                vec![Msg::withdraw_commission("cosmosvaloper1x")],
            )
            .unwrap(),
            memo: "vigil".into(),
        }
    }

    fn gaia() -> NetworkOverride {
        NetworkOverride {
            chain_binary: Some("gaiad".into()),
            rpc_endpoint: Some("https://rpc.test:443".into()),
            gas_prices: Some("0.025uatom".into()),
            ..Default::default()
        }
    }

    fn client(config: ChainClientConfig, transport: Arc<NullTransport>) -> CliChainClient {
        let mut networks = BTreeMap::new();
        networks.insert("cosmoshub".to_string(), gaia());
        CliChainClient::new(
            config,
            NetworkProfiles::new(networks),
            transport,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn exec_args_prefer_flat_fees() {
        let mut config = ChainClientConfig::default();
        let c = client(config.clone(), Arc::new(NullTransport::new()));
        let tx_file = Path::new("/tmp/tx.json");
        let args = c.exec_args(&request(), tx_file, "https://rpc.test:443", &gaia());
        assert_eq!(&args[..4], ["tx", "authz", "exec", "/tmp/tx.json"]);
        assert!(args.windows(2).any(|w| w == ["--from", "sweeper"]));
        assert!(args.windows(2).any(|w| w == ["--chain-id", "cosmoshub-4"]));
        assert!(args.windows(2).any(|w| w == ["--gas-prices", "0.025uatom"]));
        assert!(!args.contains(&"--home".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--yes"));

        config.fees = Some("5000uatom".into());
        config.home = Some(PathBuf::from("/keys"));
        let c = client(config, Arc::new(NullTransport::new()));
        let tx_file = Path::new("/tmp/tx.json");
        let args = c.exec_args(&request(), tx_file, "https://rpc.test:443", &gaia());
        assert!(args.windows(2).any(|w| w == ["--fees", "5000uatom"]));
        assert!(args.windows(2).any(|w| w == ["--home", "/keys"]));
        assert!(!args.contains(&"--gas-prices".to_string()));
    }

    #[test]
    fn events_come_from_logs() {
        let tx: TxResponse = serde_json::from_str(
            r#"{"txhash":"AB","code":0,"raw_log":"","logs":[{"events":[
                {"type":"withdraw_commission","attributes":[{"key":"amount","value":"10uatom"}]}
            ]}],"events":[]}"#,
        )
        .unwrap();
        let result = tx_result(&tx);
        assert_eq!(result.txhash, "AB");
        assert_eq!(
            result.events,
            vec![Event::new("withdraw_commission", &[("amount", "10uatom")])]
        );
    }

    #[tokio::test]
    async fn unconfigured_network_is_refused() {
        let c = client(ChainClientConfig::default(), Arc::new(NullTransport::new()));
        let mut req = request();
        req.network = "osmosis".into();
        let err = c.sign_and_broadcast(&req).await.unwrap_err();
        assert!(matches!(err, TransactionError::Broadcast(m) if m.contains("chain_binary")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn broadcasts_through_binary_and_polls_commit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gaiad");
        std::fs::write(&script, "#!/bin/sh\necho '{\"txhash\":\"FEED\",\"code\":0}'\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let transport = Arc::new(NullTransport::new());
        transport.ok(
            "https://lcd.test/cosmos/tx/v1beta1/txs/FEED",
            r#"{"tx_response":{"txhash":"FEED","code":0,"raw_log":"","events":[
                {"type":"withdraw_rewards","attributes":[{"key":"amount","value":"7uatom"}]}
            ]}}"#,
        );
        let config = ChainClientConfig {
            binary_dir: Some(dir.path().to_path_buf()),
            tx_poll_interval_secs: 0,
            tx_poll_attempts: 2,
            ..Default::default()
        };
        let result = client(config, transport.clone())
            .sign_and_broadcast(&request())
            .await
            .unwrap();
        assert_eq!(result.txhash, "FEED");
        assert_eq!(result.events.len(), 1);
        assert_eq!(transport.count_calls("/txs/FEED"), 1);
    }

    #[cfg(unix)]
    fn fake_binary(dir: &std::path::Path, stdout: &str) {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("gaiad");
        std::fs::write(&script, format!("#!/bin/sh\necho '{stdout}'\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn accepted_but_unindexed_tx_keeps_its_hash() {
        let dir = tempfile::tempdir().unwrap();
        fake_binary(dir.path(), r#"{"txhash":"FEED","code":0}"#);
        let transport = Arc::new(NullTransport::new());
        transport.respond(
            "https://lcd.test/cosmos/tx/v1beta1/txs/FEED",
            404,
            r#"{"code":5,"message":"tx not found: FEED"}"#,
        );
        let config = ChainClientConfig {
            binary_dir: Some(dir.path().to_path_buf()),
            tx_poll_interval_secs: 0,
            tx_poll_attempts: 3,
            ..Default::default()
        };

        let err = client(config, transport.clone())
            .sign_and_broadcast(&request())
            .await
            .unwrap_err();

        assert_eq!(err.submitted_txhash(), Some("FEED"));
        assert!(!err.is_retryable());
        assert_eq!(transport.count_calls("/txs/FEED"), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn garbled_output_may_be_on_chain() {
        let dir = tempfile::tempdir().unwrap();
        fake_binary(dir.path(), "gas estimate: 81234");
        let config = ChainClientConfig {
            binary_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let err = client(config, Arc::new(NullTransport::new()))
            .sign_and_broadcast(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, TransactionError::UnreadableResponse(_)));
        assert!(err.may_be_on_chain());
    }
}
