mod control_cycle_tests;
mod mock_hw;
