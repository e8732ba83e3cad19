use duetpanel_communication::{join_commands, PanelCommand};
use proptest::prelude::*;

proptest! {
    #[test]
    fn whole_temperatures_have_no_fraction(heater in 0usize..8, temp in 0u32..400) {
        let command = PanelCommand::HeaterActive { heater, temperature: f64::from(temp) };
        prop_assert_eq!(command.to_string(), format!("M568 P{} S{} A2", heater, temp));
    }

    #[test]
    fn joined_commands_keep_order(heaters in prop::collection::vec(0usize..8, 1..6)) {
        let commands: Vec<PanelCommand> = heaters
            .iter()
            .map(|&heater| PanelCommand::HeaterOff { heater })
            .collect();
        let joined = join_commands(&commands);
        let expected: Vec<String> = heaters.iter().map(|h| format!("M568 P{} A0", h)).collect();
        prop_assert_eq!(joined, expected.join(" "));
    }
}
