
/// Scripting ids of every element the workflow touches
///
/// Defaults are those of transaction `ZMM_RECEP_DOCU` on S/4. Any of them
/// can be overridden under `[screen]` in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScreenIds {
    pub main_window: String,
    pub command_field: String,
    pub user_field: String,
    pub password_field: String,

    /// Transaction code as typed in the command field
    pub transaction: String,
    pub po_filter: String,
    pub execute_button: String,
    pub edit_button: String,

    pub grid: String,
    pub add_row_button: String,
    pub columns: GridColumns,

    pub header_button: String,
    pub remito1_field: String,
    pub remito2_field: String,
    pub cold_packages_field: String,
    pub dry_packages_field: String,
    pub invoice_field: String,
    pub generate_button: String,
    pub confirm_button: String,
    pub cover_title_field: String,
    pub print_button: String,
}

impl Default for ScreenIds {
    fn default() -> Self {
        Self {
            main_window:         "wnd[0]".into(),
            command_field:       "wnd[0]/tbar[0]/okcd".into(),
            user_field:          "wnd[0]/usr/txtRSYST-BNAME".into(),
            password_field:      "wnd[0]/usr/pwdRSYST-BCODE".into(),

            transaction:         "/nZMM_RECEP_DOCU".into(),
            po_filter:           "wnd[0]/usr/ctxtSO_EBELN-LOW".into(),
            execute_button:      "wnd[0]/tbar[1]/btn[8]".into(),
            edit_button:         "wnd[0]/tbar[1]/btn[20]".into(),

            grid:                "wnd[0]/usr/cntlGRID1/shellcont/shell".into(),
            add_row_button:      "wnd[0]/tbar[1]/btn[7]".into(),
            columns:             GridColumns::default(),

            header_button:       "wnd[0]/tbar[1]/btn[21]".into(),
            remito1_field:       "wnd[1]/usr/txtGV_0100_REMITO1".into(),
            remito2_field:       "wnd[1]/usr/txtGV_0100_REMITO2".into(),
            cold_packages_field: "wnd[1]/usr/txtGV_0100_BULTOS_FRIO".into(),
            dry_packages_field:  "wnd[1]/usr/txtGV_0100_BULTOS_SECO".into(),
            invoice_field:       "wnd[1]/usr/txtGV_0100_FACTURA1".into(),
            generate_button:     "wnd[1]/usr/btnBOT_GENERAR".into(),
            confirm_button:      "wnd[1]/tbar[0]/btn[0]".into(),
            cover_title_field:   "wnd[1]/usr/txtSSFPP-TDCOVTITLE".into(),
            print_button:        "wnd[1]/tbar[0]/btn[86]".into(),
        }
    }
}

/// Column keys of the receiving grid
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GridColumns {
    pub ean: String,
    /// Quantity still open on the purchase order line
    pub pending: String,
    /// Quantity being received
    pub quantity: String,
    pub batch: String,
    pub expiry: String,
}

impl Default for GridColumns {
    fn default() -> Self {
        Self {
            ean:      "ZZEAN13".into(),
            pending:  "CANT_PEND".into(),
            quantity: "CANTIDAD".into(),
            batch:    "CHARG".into(),
            expiry:   "VENCIMIENTO".into(),
        }
    }
}
