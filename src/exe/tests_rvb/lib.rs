mod passthrough_tests;
