#![cfg(test)]
use std::collections::HashMap;
use std::sync::Arc;

use rackscan_common::config::{MacReport, ScanConfig};
use rackscan_common::model::{InventoryDocument, ScanTask};
use rackscan_core::scanner::{self, ClientFactory};
use rackscan_wsman::testing::ScriptedClient;
use rackscan_wsman::{ManagementClient, WsmanError};

/// Hands out one pre-scripted client per address; every other address in
/// the scanned range behaves like a dead host.
struct ScriptedFactory {
    clients: HashMap<String, Arc<ScriptedClient>>,
}

impl ScriptedFactory {
    fn new(clients: Vec<(&str, ScriptedClient)>) -> Arc<Self> {
        Arc::new(Self {
            clients: clients
                .into_iter()
                .map(|(addr, client)| (addr.to_string(), Arc::new(client)))
                .collect(),
        })
    }
}

impl ClientFactory for ScriptedFactory {
    fn client_for(&self, task: &ScanTask) -> Result<Arc<dyn ManagementClient>, WsmanError> {
        let addr = task.address.to_string();
        match self.clients.get(&addr) {
            Some(client) => Ok(client.clone() as Arc<dyn ManagementClient>),
            None => Ok(Arc::new(ScriptedClient::new(&format!(
                "https://{addr}/wsman"
            )))),
        }
    }
}

fn controller(endpoint: &str) -> ScriptedClient {
    ScriptedClient::new(endpoint)
        .on_identify(
            "<Envelope><Body><IdentifyResponse><ProductName>iDRAC</ProductName></IdentifyResponse></Body></Envelope>",
        )
        .on_enumerate(
            "DCIM_SystemView",
            "<Envelope><Body><DCIM_SystemView><SysMemTotalSize>16384</SysMemTotalSize></DCIM_SystemView></Body></Envelope>",
        )
        .on_enumerate(
            "DCIM_CPUView",
            "<Envelope><Body>\
             <DCIM_CPUView><NumberOfEnabledCores>4</NumberOfEnabledCores></DCIM_CPUView>\
             <DCIM_CPUView><NumberOfEnabledCores>4</NumberOfEnabledCores></DCIM_CPUView>\
             </Body></Envelope>",
        )
        .on_enumerate(
            "DCIM_VirtualDiskView",
            "<Envelope><Body>\
             <DCIM_VirtualDiskView/><DCIM_VirtualDiskView/>\
             </Body></Envelope>",
        )
        .on_enumerate(
            "DCIM_NICView",
            "<Envelope><Body>\
             <DCIM_NICView><FQDD>NIC.Integrated.1-1</FQDD><LinkSpeed>3</LinkSpeed><CurrentMACAddress>AA:BB:CC:DD:EE:FF</CurrentMACAddress></DCIM_NICView>\
             <DCIM_NICView><FQDD>NIC.Integrated.1-2</FQDD><LinkSpeed>3</LinkSpeed><CurrentMACAddress>00:11:22:33:44:55</CurrentMACAddress></DCIM_NICView>\
             <DCIM_NICView><FQDD>NIC.Slot.1-1</FQDD><LinkSpeed>3</LinkSpeed><CurrentMACAddress>99:99:99:99:99:99</CurrentMACAddress></DCIM_NICView>\
             </Body></Envelope>",
        )
}

fn config(mac_report: MacReport) -> ScanConfig {
    ScanConfig {
        username: "root".to_string(),
        password: "calvin".to_string(),
        workers: 8,
        mac_report,
        ..ScanConfig::default()
    }
}

#[tokio::test]
async fn dead_range_produces_an_empty_document() {
    let factory = ScriptedFactory::new(Vec::new());
    let report = scanner::scan("192.0.2.1-192.0.2.20", &config(MacReport::All), factory).await;

    assert!(report.records.is_empty());
    assert!(report.errors.is_empty());

    let json = serde_json::to_value(InventoryDocument {
        nodes: report.records,
    })
    .unwrap();
    assert_eq!(json["nodes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn full_inventory_lands_in_the_output_document() {
    let factory = ScriptedFactory::new(vec![("192.0.2.7", controller("https://192.0.2.7/wsman"))]);
    let report = scanner::scan("192.0.2.1-192.0.2.10", &config(MacReport::All), factory).await;

    assert!(report.errors.is_empty());
    assert_eq!(report.records.len(), 1);

    let json = serde_json::to_value(InventoryDocument {
        nodes: report.records,
    })
    .unwrap();
    let node = &json["nodes"][0];
    assert_eq!(node["pm_type"], "pxe_drac");
    assert_eq!(node["pm_user"], "root");
    assert_eq!(node["pm_password"], "calvin");
    assert_eq!(node["pm_addr"], "192.0.2.7");
    assert_eq!(node["cpu"], "8");
    assert_eq!(node["memory"], "16384");
    assert_eq!(node["disk"], "2");
    assert_eq!(node["arch"], "x86_64");
    let macs: Vec<&str> = node["mac"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m.as_str().unwrap())
        .collect();
    assert_eq!(macs, vec!["00:11:22:33:44:55", "aa:bb:cc:dd:ee:ff"]);
}

#[tokio::test(start_paused = true)]
async fn boot_nic_mode_configures_pxe_and_waits_for_the_job() {
    let client = controller("https://192.0.2.7/wsman")
        .on_get(
            "DCIM_NICEnumeration",
            "<Envelope><Body><CurrentValue>NONE</CurrentValue></Body></Envelope>",
        )
        .on_invoke(
            "SetAttribute",
            "<Envelope><Body><SetAttribute_OUTPUT><ReturnValue>0</ReturnValue><RebootRequired>Yes</RebootRequired></SetAttribute_OUTPUT></Body></Envelope>",
        )
        .on_invoke(
            "CreateTargetedConfigJob",
            r#"<Envelope><Body><CreateTargetedConfigJob_OUTPUT><ReturnValue>4096</ReturnValue></CreateTargetedConfigJob_OUTPUT><ReferenceParameters><SelectorSet><Selector Name="InstanceID">JID_42</Selector></SelectorSet></ReferenceParameters></Body></Envelope>"#,
        )
        .on_get(
            "DCIM_LifecycleJob",
            "<Envelope><Body><DCIM_LifecycleJob><JobStatus>Running</JobStatus></DCIM_LifecycleJob></Body></Envelope>",
        )
        .on_get(
            "DCIM_LifecycleJob",
            "<Envelope><Body><DCIM_LifecycleJob><JobStatus>Completed</JobStatus></DCIM_LifecycleJob></Body></Envelope>",
        );

    let factory = ScriptedFactory::new(vec![("192.0.2.7", client)]);
    let handle = factory.clients.get("192.0.2.7").unwrap().clone();

    let report = scanner::scan("192.0.2.7", &config(MacReport::BootNic), factory).await;

    assert_eq!(report.records.len(), 1);
    // the boot NIC is the smallest integrated FQDD, so its MAC is the one
    // reported
    assert_eq!(report.records[0].mac, vec!["aa:bb:cc:dd:ee:ff"]);

    let calls = handle.calls();
    assert!(calls.contains(&"invoke SetAttribute".to_string()));
    assert!(calls.contains(&"invoke CreateTargetedConfigJob".to_string()));
    let polls = calls
        .iter()
        .filter(|c| c.as_str() == "get DCIM_LifecycleJob")
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn mixed_results_keep_good_records_and_collect_errors() {
    let bad = ScriptedClient::new("https://192.0.2.3/wsman")
        .on_identify(
            "<Envelope><Body><IdentifyResponse><ProductName>iDRAC</ProductName></IdentifyResponse></Body></Envelope>",
        )
        .on_enumerate(
            "DCIM_CPUView",
            "<Envelope><Body><DCIM_CPUView><NumberOfEnabledCores></NumberOfEnabledCores></DCIM_CPUView></Body></Envelope>",
        );
    let factory = ScriptedFactory::new(vec![
        ("192.0.2.3", bad),
        ("192.0.2.5", controller("https://192.0.2.5/wsman")),
    ]);

    let report = scanner::scan("192.0.2.1-192.0.2.6", &config(MacReport::All), factory).await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].address, "192.0.2.5");
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].0, "192.0.2.3");
}
